mod answer;
mod exam;
mod ids;
mod result;

pub use ids::{ChoiceId, EntryId, ExamId, ParseIdError, QuestionId};

pub use answer::Answer;
pub use exam::{Choice, ExamDefinition, ExamError, Question, QuestionKind};
pub use result::{ExamResult, ExamResultError};

#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod answer;
pub mod context;

pub use answer::{Answer, AnswerEngine, AnswerOutcome, FileCitation, OpenAiAnswerClient};
pub use context::build_course_context;

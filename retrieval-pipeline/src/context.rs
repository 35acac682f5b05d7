use std::collections::HashMap;

use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{
            course::Course,
            level::Level,
            question::Question,
            question_set::QuestionSet,
            reference_document::{DocumentSource, ReferenceDocument},
        },
    },
};

/// Flattens a course's reference material and curriculum into one text blob
/// for direct-context answering and debugging. Reads each tier in a single
/// batched query and regroups into tree order in memory.
pub async fn build_course_context(
    course_id: &str,
    db: &SurrealDbClient,
) -> Result<String, AppError> {
    let course = Course::get_by_id(course_id, db).await?;

    let documents = ReferenceDocument::list_active_by_course(course_id, db).await?;
    let sets = QuestionSet::list_by_course(course_id, db).await?;
    let set_ids: Vec<String> = sets.iter().map(|set| set.id.clone()).collect();
    let levels = Level::list_by_sets(&set_ids, db).await?;
    let level_ids: Vec<String> = levels.iter().map(|level| level.id.clone()).collect();
    let questions = Question::list_by_levels(&level_ids, db).await?;

    // The readers return rows in position order; grouping preserves it.
    let mut levels_by_set: HashMap<String, Vec<Level>> = HashMap::new();
    for level in levels {
        levels_by_set
            .entry(level.set_id.clone())
            .or_default()
            .push(level);
    }
    let mut questions_by_level: HashMap<String, Vec<Question>> = HashMap::new();
    for question in questions {
        questions_by_level
            .entry(question.level_id.clone())
            .or_default()
            .push(question);
    }

    let mut context = String::new();
    context.push_str(&format!("# Course: {}\n\n{}\n", course.title, course.description));

    if !documents.is_empty() {
        context.push_str("\n## Reference material\n");
        for document in &documents {
            context.push_str(&format!("\n### {}\n", document.title));
            match &document.source {
                DocumentSource::Local { text } => {
                    context.push_str(text);
                    context.push('\n');
                }
                DocumentSource::Remote {
                    file_id, file_name, ..
                } => {
                    context.push_str(&format!("[indexed file: {file_name} ({file_id})]\n"));
                }
            }
        }
    }

    if !sets.is_empty() {
        context.push_str("\n## Curriculum\n");
        for set in &sets {
            context.push_str(&format!("\n### Set: {}\n", set.title));
            if !set.description.is_empty() {
                context.push_str(&format!("{}\n", set.description));
            }

            for level in levels_by_set.get(&set.id).map(Vec::as_slice).unwrap_or_default() {
                context.push_str(&format!("\n#### Level: {}\n", level.title));

                for question in questions_by_level
                    .get(&level.id)
                    .map(Vec::as_slice)
                    .unwrap_or_default()
                {
                    context.push_str(&format!(
                        "\nQ: {}\nA: {}\n",
                        question.prompt, question.answer
                    ));
                    if let Some(explanation) = &question.explanation {
                        context.push_str(&format!("Explanation: {explanation}\n"));
                    }
                }
            }
        }
    }

    Ok(context)
}

//! Sentence selection and answer rendering strategies.

use super::question::{QuestionAnalysis, QuestionType, classify_question, extract_key_terms};
use super::scoring::{self, ScoredSentence, ScoringProfile};
use super::segment::segment;

/// Returned when the context is empty or whitespace only.
pub const EMPTY_CONTEXT_MESSAGE: &str = "I don't have enough information to answer that question. Please make sure the document has been properly uploaded and processed.";

/// Returned when no sentence survives segmentation.
pub const NO_SENTENCES_MESSAGE: &str =
    "I couldn't extract any meaningful information from the document to answer your question.";

/// Returned when sentences exist but none scores above zero.
pub const NO_MATCH_MESSAGE: &str =
    "I couldn't find specific information related to your question in the document.";

/// Number of sentences kept for an answer to the analysed question.
pub fn selection_limit(analysis: &QuestionAnalysis) -> usize {
    if analysis.is_process {
        4
    } else if analysis.is_definition {
        2
    } else {
        3
    }
}

/// Pick the best sentences: positive scores only, highest score first, ties broken by relevance.
pub fn select(scored: &[ScoredSentence], analysis: &QuestionAnalysis) -> Vec<String> {
    let mut candidates: Vec<&ScoredSentence> =
        scored.iter().filter(|sentence| sentence.score > 0.0).collect();
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.relevance.total_cmp(&a.relevance))
    });

    candidates
        .into_iter()
        .take(selection_limit(analysis))
        .map(|sentence| sentence.text.clone())
        .collect()
}

/// Strategy that renders selected sentences into the final answer.
pub trait Composer {
    /// Scoring weights this composer expects sentences to be ranked with.
    fn profile(&self) -> ScoringProfile;

    /// Render the answer from sentences already ordered by [`select`].
    fn compose(&self, selected: &[String], analysis: &QuestionAnalysis) -> String;
}

/// Joins cleaned sentences without any framing text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainComposer;

impl Composer for PlainComposer {
    fn profile(&self) -> ScoringProfile {
        ScoringProfile::PLAIN
    }

    fn compose(&self, selected: &[String], analysis: &QuestionAnalysis) -> String {
        let cleaned = selected
            .iter()
            .map(|sentence| strip_non_alphabetic(sentence))
            .filter(|sentence| !sentence.is_empty());

        if analysis.is_definition {
            cleaned.take(2).collect::<Vec<_>>().join(" ")
        } else {
            cleaned.collect::<Vec<_>>().join(" ")
        }
    }
}

/// Prefixes the joined sentences with a phrase chosen by question type.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateComposer;

impl TemplateComposer {
    /// Framing phrase used for each question type.
    pub const fn prefix(question_type: QuestionType) -> &'static str {
        match question_type {
            QuestionType::What => "Based on the document:",
            QuestionType::How | QuestionType::Where => "According to the document:",
            QuestionType::Why => "The document indicates that",
            QuestionType::When => "The document states that",
            QuestionType::Who => "The document mentions that",
            QuestionType::General => "Based on the available information:",
        }
    }
}

impl Composer for TemplateComposer {
    fn profile(&self) -> ScoringProfile {
        ScoringProfile::TEMPLATE
    }

    fn compose(&self, selected: &[String], analysis: &QuestionAnalysis) -> String {
        let body = selected
            .iter()
            .map(|sentence| sentence.trim())
            .filter(|sentence| !sentence.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if body.is_empty() {
            return body;
        }
        format!("{} {}", Self::prefix(analysis.question_type), body)
    }
}

/// Lead phrase for single-sentence answers.
pub const fn lead(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::What => "Based on the document,",
        QuestionType::How | QuestionType::Where => "According to the document,",
        QuestionType::Why => "The document indicates that",
        QuestionType::When => "The document states that",
        QuestionType::Who => "The document mentions that",
        QuestionType::General => "Based on the available information:",
    }
}

/// Answer with the single highest-scoring sentence behind a [`lead`] phrase.
///
/// Sentences are ranked with [`ScoringProfile::TEMPLATE`]. The earliest sentence wins ties, and
/// the first sentence is used when no key term matches anywhere.
pub fn best_sentence_answer(question: &str, context: &str) -> String {
    if context.trim().is_empty() {
        return EMPTY_CONTEXT_MESSAGE.to_string();
    }

    let sentences = segment(context);
    let analysis = classify_question(question);
    let key_terms = extract_key_terms(question);
    let scored = scoring::score(&sentences, &analysis, &key_terms, ScoringProfile::TEMPLATE);

    let Some(best) = scored
        .iter()
        .reduce(|best, sentence| if sentence.score > best.score { sentence } else { best })
    else {
        return NO_SENTENCES_MESSAGE.to_string();
    };

    format!("{} {}", lead(analysis.question_type), best.text.trim())
}

fn strip_non_alphabetic(sentence: &str) -> &str {
    sentence.trim_matches(|c: char| !c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::question::classify_question;

    fn scored(text: &str, score: f64, relevance: f64) -> ScoredSentence {
        ScoredSentence {
            text: text.into(),
            position: 0,
            score,
            relevance,
        }
    }

    #[test]
    fn select_orders_by_score_then_relevance() {
        let analysis = classify_question("Why is this slow?");
        let sentences = vec![
            scored("low", 1.0, 1.0),
            scored("tie-less-relevant", 5.0, 0.2),
            scored("zero", 0.0, 1.0),
            scored("tie-more-relevant", 5.0, 0.8),
            scored("top", 9.0, 0.0),
        ];

        let selected = select(&sentences, &analysis);
        assert_eq!(selected, vec!["top", "tie-more-relevant", "tie-less-relevant"]);
    }

    #[test]
    fn selection_limit_depends_on_question_type() {
        assert_eq!(selection_limit(&classify_question("What is a mutex?")), 2);
        assert_eq!(selection_limit(&classify_question("How do I build it?")), 4);
        assert_eq!(selection_limit(&classify_question("Who wrote it?")), 3);
    }

    #[test]
    fn plain_composer_strips_and_joins() {
        let analysis = classify_question("Why does it matter?");
        let answer = PlainComposer.compose(
            &["  42. Caches reduce latency.".into(), "(They also save cost!)".into()],
            &analysis,
        );
        assert_eq!(answer, "Caches reduce latency They also save cost");
    }

    #[test]
    fn plain_composer_limits_definitions_to_two_sentences() {
        let analysis = classify_question("What is a lock?");
        let answer = PlainComposer.compose(
            &["One here.".into(), "Two here.".into(), "Three here.".into()],
            &analysis,
        );
        assert_eq!(answer, "One here Two here");
    }

    #[test]
    fn template_composer_prefixes_by_type() {
        let selected = vec!["Paris is the capital of France.".to_string()];
        let answer = TemplateComposer.compose(&selected, &classify_question("What is the capital?"));
        assert_eq!(answer, "Based on the document: Paris is the capital of France.");

        let answer = TemplateComposer.compose(&selected, &classify_question("Who founded it?"));
        assert!(answer.starts_with("The document mentions that "));

        let answer = TemplateComposer.compose(&[], &classify_question("Who founded it?"));
        assert!(answer.is_empty());
    }

    #[test]
    fn template_prefix_covers_every_question_type() {
        let cases = [
            ("What is a cache?", "Based on the document:"),
            ("How does it start?", "According to the document:"),
            ("Why did it fail?", "The document indicates that"),
            ("When did it start?", "The document states that"),
            ("Where is it located?", "According to the document:"),
            ("Who founded it?", "The document mentions that"),
            ("Tell me about the results", "Based on the available information:"),
        ];
        let selected = vec!["The index was rebuilt overnight.".to_string()];
        for (question, prefix) in cases {
            let answer = TemplateComposer.compose(&selected, &classify_question(question));
            assert_eq!(answer, format!("{prefix} The index was rebuilt overnight."), "{question}");
        }
    }

    #[test]
    fn lead_covers_every_question_type() {
        assert_eq!(lead(QuestionType::What), "Based on the document,");
        assert_eq!(lead(QuestionType::How), "According to the document,");
        assert_eq!(lead(QuestionType::Where), "According to the document,");
        assert_eq!(lead(QuestionType::Why), "The document indicates that");
        assert_eq!(lead(QuestionType::When), "The document states that");
        assert_eq!(lead(QuestionType::Who), "The document mentions that");
        assert_eq!(lead(QuestionType::General), "Based on the available information:");
    }

    #[test]
    fn best_sentence_picks_highest_score() {
        let context = "The build runs nightly on the cluster. Deployments happen every Friday afternoon.";
        let answer = best_sentence_answer("When do deployments happen?", context);
        assert_eq!(
            answer,
            "The document states that Deployments happen every Friday afternoon."
        );
    }

    #[test]
    fn best_sentence_falls_back_to_first_sentence() {
        let context = "The build runs nightly on the cluster. Deployments happen every Friday.";
        let answer = best_sentence_answer("Who owns the penguins?", context);
        assert_eq!(
            answer,
            "The document mentions that The build runs nightly on the cluster."
        );
    }

    #[test]
    fn best_sentence_handles_degenerate_context() {
        assert_eq!(best_sentence_answer("What?", "  "), EMPTY_CONTEXT_MESSAGE);
        assert_eq!(best_sentence_answer("What?", "A. B? C!"), NO_SENTENCES_MESSAGE);
    }
}

use super::base::{KnowledgeBase, terms};
use agora_application::ports::rag_retrieval::{RagRetrievalPort, RetrievalError, RetrievedDocument};
use async_trait::async_trait;
use std::sync::Arc;

/// Ranks notes by the fraction of query terms they contain
pub struct KeywordRetriever {
    knowledge: Arc<KnowledgeBase>,
}

impl KeywordRetriever {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }
}

#[async_trait]
impl RagRetrievalPort for KeywordRetriever {
    async fn retrieve(
        &self,
        query: &str,
        limit: usize,
        organization: Option<&str>,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        let query_terms = terms(query);
        if query_terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<RetrievedDocument> = self
            .knowledge
            .notes()
            .iter()
            .filter(|note| note.visible_to(organization))
            .filter_map(|note| {
                let note_terms = terms(&note.content);
                let hits = query_terms.intersection(&note_terms).count();
                (hits > 0).then(|| {
                    RetrievedDocument::new(
                        note.id.clone(),
                        note.content.clone(),
                        hits as f64 / query_terms.len() as f64,
                    )
                })
            })
            .collect();

        // Stable sort keeps note order for equal scores
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::base::Note;

    fn retriever() -> KeywordRetriever {
        let base = KnowledgeBase::new()
            .with_note(Note::new("air", "Air quality improved in the city centre."))
            .with_note(Note::new("traffic", "City traffic fell after cars were banned."))
            .with_note(
                Note::new("acme", "Acme lobbied against car bans.").with_organization("acme"),
            );
        KeywordRetriever::new(Arc::new(base))
    }

    #[tokio::test]
    async fn test_ranks_by_term_overlap() {
        let docs = retriever()
            .retrieve("Should cars be banned from the city?", 5, None)
            .await
            .unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["traffic", "air"]);
        assert!(docs[0].score > docs[1].score);
    }

    #[tokio::test]
    async fn test_respects_limit_and_organization() {
        let retriever = retriever();
        let docs = retriever.retrieve("car bans city", 1, None).await.unwrap();
        assert_eq!(docs.len(), 1);

        let acme = retriever.retrieve("lobbied", 5, Some("acme")).await.unwrap();
        assert_eq!(acme[0].id, "acme");
        assert!(retriever.retrieve("lobbied", 5, Some("globex")).await.unwrap().is_empty());
    }
}

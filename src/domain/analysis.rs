use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSection {
    pub subtitle: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDocument {
    pub title: String,
    pub sections: Vec<AnalysisSection>,
    pub recommendation: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

// Deterministic stand-in used when no LLM key is configured and when the
// live call falls back.
pub fn mock_analysis_document(query: &str, source_urls: &[String]) -> AnalysisDocument {
    let subject = query.trim().to_lowercase();

    AnalysisDocument {
        title: format!("Analyse Qualitative - {}", query.trim()),
        sections: vec![
            AnalysisSection {
                subtitle: "Vue d'ensemble du marché".to_string(),
                content: format!(
                    "Le marché {} connaît une croissance dynamique portée par \
                     l'innovation technologique et l'évolution des comportements \
                     des consommateurs.",
                    subject
                ),
            },
            AnalysisSection {
                subtitle: "Tendances principales".to_string(),
                content: "• Digitalisation accélérée des processus et services\n\
                          • Croissance de la demande pour des solutions durables\n\
                          • Consolidation du marché avec des fusions-acquisitions\n\
                          • Expansion internationale des principaux acteurs"
                    .to_string(),
            },
            AnalysisSection {
                subtitle: "Acteurs principaux".to_string(),
                content: format!(
                    "Le marché {} est dominé par plusieurs acteurs majeurs qui \
                     investissent massivement dans l'innovation, tandis que de \
                     nouveaux entrants apportent disruption et différenciation.",
                    subject
                ),
            },
            AnalysisSection {
                subtitle: "Opportunités".to_string(),
                content: "• Forte demande dans les segments premium\n\
                          • Marchés émergents en pleine croissance\n\
                          • Technologies disruptives créant de nouvelles niches\n\
                          • Services à valeur ajoutée et personnalisation"
                    .to_string(),
            },
            AnalysisSection {
                subtitle: "Défis et risques".to_string(),
                content: "• Concurrence intense et pression sur les prix\n\
                          • Réglementations de plus en plus strictes\n\
                          • Volatilité des coûts des matières premières\n\
                          • Changements rapides des préférences consommateurs"
                    .to_string(),
            },
        ],
        recommendation: format!(
            "Le marché {} offre des opportunités stratégiques significatives. \
             Nous recommandons une approche focalisée sur l'innovation, la \
             différenciation et l'expansion géographique ciblée.",
            subject
        ),
        sources: source_urls.to_vec(),
    }
}

// Plain-text rendition of the template document, used as the degraded chat
// answer.
pub fn template_answer(message: &str) -> String {
    let document = mock_analysis_document(message, &[]);
    let overview = document
        .sections
        .first()
        .map(|s| s.content.clone())
        .unwrap_or_default();

    format!(
        "{}\n\n{}\n\n{}",
        document.title, overview, document.recommendation
    )
}

pub fn rejection_message() -> String {
    "Je suis spécialisé dans l'analyse de marché et votre demande ne semble pas \
     porter sur une étude de marché.\n\n\
     Voici des exemples de requêtes que je peux traiter :\n\
     • \"Analyse du marché des véhicules électriques en France\"\n\
     • \"Taille et croissance du marché du luxe\"\n\
     • \"Principaux acteurs du marché des télécommunications en Europe\"\n\n\
     Reformulez votre question en précisant le marché ou le secteur à analyser."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_document_is_deterministic() {
        let sources = vec!["https://a.example".to_string()];

        let first = mock_analysis_document("marché du luxe", &sources);
        let second = mock_analysis_document("marché du luxe", &sources);

        assert_eq!(first, second);
    }

    #[test]
    fn mock_document_carries_five_sections_and_sources() {
        let sources = vec!["https://a.example".to_string(), "https://b.example".to_string()];

        let document = mock_analysis_document("véhicules électriques", &sources);

        assert_eq!(document.sections.len(), 5);
        assert!(document.sections.iter().all(|s| !s.content.is_empty()));
        assert_eq!(document.sources, sources);
        assert!(document.title.contains("véhicules électriques"));
    }

    #[test]
    fn template_answer_carries_title_overview_and_recommendation() {
        let answer = template_answer("marché du luxe");

        assert!(answer.starts_with("Analyse Qualitative - marché du luxe"));
        assert!(answer.contains("Le marché marché du luxe connaît"));
        assert!(answer.contains("Nous recommandons"));
    }

    #[test]
    fn rejection_message_lists_example_queries() {
        let message = rejection_message();

        assert!(message.contains("analyse de marché"));
        assert!(message.contains("véhicules électriques"));
    }
}

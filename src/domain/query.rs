// Words that carry no signal in a catalog keyword search. The full query,
// stop words included, is still what gets embedded for ranking.
const STOP_WORDS: [&str; 59] = [
    "le", "la", "les", "l", "de", "des", "du", "d", "un", "une", "et", "en", "sur", "pour",
    "dans", "au", "aux", "par", "avec", "marché", "marche", "marchés", "marches", "analyse",
    "analyses", "étude", "etude", "études", "etudes", "données", "donnees", "statistique",
    "statistiques", "secteur", "évolution", "evolution", "tendance", "tendances", "chiffres",
    "the", "a", "an", "of", "in", "on", "for", "and", "to", "with", "market", "markets",
    "analysis", "data", "dataset", "datasets", "statistics", "study", "sector", "trends",
];

pub fn catalog_keywords(query: &str) -> String {
    let kept: Vec<&str> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .filter(|token| !STOP_WORDS.contains(&token.to_lowercase().as_str()))
        .collect();

    match kept.is_empty() {
        true => query.trim().to_string(),
        false => kept.join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::catalog_keywords;

    #[test]
    fn strips_french_market_vocabulary() {
        assert_eq!(
            catalog_keywords("analyse du marché des véhicules électriques en France"),
            "véhicules électriques France"
        );
    }

    #[test]
    fn strips_english_market_vocabulary() {
        assert_eq!(
            catalog_keywords("electric vehicle market analysis in France"),
            "electric vehicle France"
        );
    }

    #[test]
    fn splits_on_apostrophes() {
        assert_eq!(catalog_keywords("l'automobile en Île-de-France"), "automobile Île France");
    }

    #[test]
    fn falls_back_to_the_original_query_when_everything_is_stripped() {
        assert_eq!(catalog_keywords("analyse du marché"), "analyse du marché");
        assert_eq!(catalog_keywords("  market data  "), "market data");
    }
}

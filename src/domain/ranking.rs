const SIMILARITY_WEIGHT: f64 = 70.0;
const RESOURCE_POINTS: f64 = 2.0;
const RESOURCE_BONUS_CAP: f64 = 5.0;
const FOLLOWER_DIVISOR: f64 = 10.0;
const FOLLOWER_BONUS_CAP: f64 = 10.0;
const AUTHORITY_BONUS: f64 = 10.0;
const DESCRIPTION_EMBED_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct RankingSignals {
    pub tabular_resources: usize,
    pub followers: u64,
    pub description_chars: usize,
    pub organization: String,
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|y| y * y).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// The text that gets embedded for a candidate: title plus the head of the
// description, so long descriptions cannot drown the title.
pub fn embedding_text(title: &str, description: &str) -> String {
    let truncated: String = description.chars().take(DESCRIPTION_EMBED_CHARS).collect();
    format!("{} {}", title, truncated).trim().to_string()
}

pub fn score_candidate(
    similarity: f32,
    signals: &RankingSignals,
    authority_orgs: &[String],
) -> f64 {
    let base = similarity as f64 * SIMILARITY_WEIGHT;

    let resource_bonus =
        (signals.tabular_resources as f64 * RESOURCE_POINTS).min(RESOURCE_BONUS_CAP);
    let follower_bonus = (signals.followers as f64 / FOLLOWER_DIVISOR).min(FOLLOWER_BONUS_CAP);
    let description_bonus = match signals.description_chars {
        n if n > 200 => 5.0,
        n if n > 100 => 3.0,
        n if n > 50 => 1.0,
        _ => 0.0,
    };

    let organization = signals.organization.to_lowercase();
    let authority_bonus = match authority_orgs
        .iter()
        .any(|org| organization.contains(&org.to_lowercase()))
    {
        true => AUTHORITY_BONUS,
        false => 0.0,
    };

    base + resource_bonus + follower_bonus + description_bonus + authority_bonus
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(resources: usize, followers: u64, description_chars: usize) -> RankingSignals {
        RankingSignals {
            tabular_resources: resources,
            followers,
            description_chars,
            organization: "Observatoire du marché".to_string(),
        }
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.3, 0.5, 0.2];

        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_guards_zero_norm_and_length_mismatch() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn scores_blend_similarity_and_bonuses() {
        // cosine 0.6 -> 42 base, 2 tabular resources -> +4,
        // 150-char description -> +3, no recognized organization.
        let score = score_candidate(0.6, &signals(2, 0, 150), &["insee".to_string()]);

        assert!((score - 49.0).abs() < 1e-4);
    }

    #[test]
    fn resource_and_follower_bonuses_are_capped() {
        let score = score_candidate(0.0, &signals(10, 1_000, 0), &[]);

        assert!((score - 15.0).abs() < 1e-9);
    }

    #[test]
    fn description_bonus_tiers() {
        let authority: Vec<String> = vec![];

        assert_eq!(score_candidate(0.0, &signals(0, 0, 50), &authority), 0.0);
        assert_eq!(score_candidate(0.0, &signals(0, 0, 51), &authority), 1.0);
        assert_eq!(score_candidate(0.0, &signals(0, 0, 200), &authority), 3.0);
        assert_eq!(score_candidate(0.0, &signals(0, 0, 201), &authority), 5.0);
    }

    #[test]
    fn authority_match_is_case_insensitive_substring() {
        let mut s = signals(0, 0, 0);
        s.organization = "INSEE - Institut national de la statistique".to_string();

        let score = score_candidate(0.0, &s, &["insee".to_string()]);

        assert_eq!(score, 10.0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let s = signals(3, 42, 180);
        let authority = vec!["eurostat".to_string()];

        assert_eq!(
            score_candidate(0.37, &s, &authority),
            score_candidate(0.37, &s, &authority)
        );
    }

    #[test]
    fn embedding_text_truncates_description() {
        let description = "x".repeat(400);

        let text = embedding_text("Titre", &description);

        assert_eq!(text.chars().count(), "Titre ".chars().count() + 300);
    }
}

/// Nettoyage du texte renvoyé par les providers IA avant décodage JSON.
///
/// Heuristique volontairement conservée telle quelle (compatibilité avec
/// l'historique du service):
///   1. retirer les fences markdown ```json ... ``` éventuelles
///   2. ne garder que la tranche entre le premier `{` et le dernier `}`
///
/// Sur une sortie modèle malformée, le résultat peut être un JSON tronqué:
/// l'appelant doit traiter l'échec de décodage comme une erreur de parsing,
/// pas tenter de le réparer.
pub fn extract_json_block(text: &str) -> &str {
    let text = strip_code_fences(text);

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let stripped = if let Some(rest) = text.strip_prefix("```json") {
        rest
    } else if let Some(rest) = text.strip_prefix("```") {
        rest
    } else {
        return text;
    };
    stripped
        .trim_start()
        .strip_suffix("```")
        .map(|s| s.trim())
        .unwrap_or_else(|| stripped.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json_untouched() {
        assert_eq!(extract_json_block(r#"{"a": 1}"#), r#"{"a": 1}"#);
    }

    #[test]
    fn test_json_fence_stripped() {
        let input = "```json\n{\"entreprise\": \"Acme\"}\n```";
        assert_eq!(extract_json_block(input), "{\"entreprise\": \"Acme\"}");
    }

    #[test]
    fn test_anonymous_fence_stripped() {
        let input = "```\n{\"score\": 80}\n```";
        assert_eq!(extract_json_block(input), "{\"score\": 80}");
    }

    #[test]
    fn test_surrounding_prose_trimmed() {
        let input = "Voici le résultat demandé :\n{\"score\": 42}\nBonne journée !";
        assert_eq!(extract_json_block(input), "{\"score\": 42}");
    }

    #[test]
    fn test_slice_spans_first_to_last_brace() {
        let input = "x {\"a\": {\"b\": 1}} y";
        assert_eq!(extract_json_block(input), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn test_no_braces_returned_as_is() {
        // Pas de tranche possible: on laisse le décodeur JSON échouer
        assert_eq!(extract_json_block("désolé, pas de JSON"), "désolé, pas de JSON");
    }
}

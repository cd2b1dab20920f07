/// Contraintes d'upload de documents (CV, lettres, etc.)

/// Extensions autorisées à l'upload
pub const ALLOWED_EXTENSIONS: [&str; 7] = ["pdf", "doc", "docx", "txt", "png", "jpg", "jpeg"];

/// Taille maximale d'un fichier: 10 MB
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Extrait l'extension en minuscules d'un nom de fichier
pub fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Vérifie que l'extension du fichier est dans la liste autorisée
pub fn is_allowed_extension(filename: &str) -> bool {
    match file_extension(filename) {
        Some(ext) => ALLOWED_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/// Nettoie un nom de fichier envoyé par le client avant stockage:
/// seuls lettres/chiffres/./-/_ sont conservés, le reste devient '_'
pub fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Empêcher la traversée de répertoires ("..")
    cleaned.replace("..", "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extensions() {
        assert!(is_allowed_extension("cv.pdf"));
        assert!(is_allowed_extension("photo.JPEG"));
        assert!(is_allowed_extension("lettre.docx"));
        assert!(!is_allowed_extension("malware.exe"));
        assert!(!is_allowed_extension("script.sh"));
        assert!(!is_allowed_extension("sans_extension"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("mon cv (final).pdf"), "mon_cv__final_.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "____etc_passwd");
        assert_eq!(sanitize_filename("rapport-2024_v2.docx"), "rapport-2024_v2.docx");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("a.PDF"), Some("pdf".to_string()));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(file_extension("nofichier"), None);
    }
}

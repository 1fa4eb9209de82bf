//! Share-URL key sanitization

/// Reduce a share URL to its bare key.
///
/// Accepts `https://.../d/<key>/edit`-style spreadsheet links and
/// `https://.../folders/<key>?usp=sharing`-style folder links; anything
/// else passes through unchanged.
pub fn sanitize_key(key: &str) -> String {
    if key.contains("/d/") {
        let parts: Vec<&str> = key.split('/').collect();
        if parts.len() >= 2 {
            return parts[parts.len() - 2].to_string();
        }
    } else if let Some(rest) = key.split("folders/").nth(1) {
        return rest.split('?').next().unwrap_or(rest).to_string();
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_key_passes_through() {
        assert_eq!(sanitize_key("1aBcD_eF"), "1aBcD_eF");
    }

    #[test]
    fn test_spreadsheet_url() {
        assert_eq!(
            sanitize_key("https://docs.google.com/spreadsheets/d/1aBcD_eF/edit"),
            "1aBcD_eF"
        );
    }

    #[test]
    fn test_folder_url() {
        assert_eq!(
            sanitize_key("https://drive.google.com/drive/folders/0XyZ?usp=sharing"),
            "0XyZ"
        );
        assert_eq!(
            sanitize_key("https://drive.google.com/drive/folders/0XyZ"),
            "0XyZ"
        );
    }
}

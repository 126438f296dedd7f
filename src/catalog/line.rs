//! Single catalog row parsing.
//!
//! A row looks like
//! `"Art/2DArt/UIImages/Common/4K/ButtonCloseNormal" "Art/Textures/Interface/2D/2DArt_UIImages_Common_4K_3.dds" 12 40 48 76`

use crate::error::{Result, SlicerError};
use crate::types::Rect;

/// Field separator between quoted tokens.
const FIELD_SEPARATOR: &str = "\" ";

/// A parsed catalog row, borrowing from the catalog text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLine<'a> {
    pub name: &'a str,
    pub container: &'a str,
    pub rect: Rect,
}

/// Parse one row. Blank rows are not passed in here.
pub fn parse_line(line: &str) -> Result<CatalogLine<'_>> {
    let rest = line
        .trim_start()
        .strip_prefix('"')
        .ok_or_else(|| malformed("missing opening quote on texture name"))?;

    let (name, rest) = rest
        .split_once(FIELD_SEPARATOR)
        .ok_or_else(|| malformed("missing closing quote on texture name"))?;

    let rest = rest
        .trim_start()
        .strip_prefix('"')
        .ok_or_else(|| malformed("missing opening quote on container path"))?;

    let (container, coords) = rest
        .split_once(FIELD_SEPARATOR)
        .ok_or_else(|| malformed("missing closing quote on container path"))?;

    if name.is_empty() || container.is_empty() {
        return Err(malformed("empty texture name or container path"));
    }

    let tokens: Vec<&str> = coords.split_whitespace().collect();
    let rect = Rect::parse(&tokens)?;

    Ok(CatalogLine {
        name,
        container,
        rect,
    })
}

fn malformed(message: &str) -> SlicerError {
    SlicerError::Parse {
        message: message.to_string(),
        help: Some("Rows are: \"name\" \"container\" x1 y1 x2 y2".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let line = "\"Art/2DArt/UIImages/Common/4K/ButtonCloseNormal\" \"Art/Textures/Interface/2D/2DArt_UIImages_Common_4K_3.dds\" 12 40 48 76";
        let parsed = parse_line(line).unwrap();

        assert_eq!(parsed.name, "Art/2DArt/UIImages/Common/4K/ButtonCloseNormal");
        assert_eq!(
            parsed.container,
            "Art/Textures/Interface/2D/2DArt_UIImages_Common_4K_3.dds"
        );
        assert_eq!(parsed.rect, Rect::new(12, 40, 36, 36));
    }

    #[test]
    fn test_parse_line_marker_rect() {
        let parsed = parse_line("\"B\" \"art/x/4k/1.dds\" 5 5 5 5").unwrap();
        assert_eq!(parsed.rect, Rect::new(5, 5, 0, 0));
    }

    #[test]
    fn test_parse_line_names_with_spaces() {
        let parsed = parse_line("\"Some Name\" \"art/a b/1.dds\" 0 0 1 1").unwrap();
        assert_eq!(parsed.name, "Some Name");
        assert_eq!(parsed.container, "art/a b/1.dds");
    }

    #[test]
    fn test_parse_line_missing_quotes() {
        assert!(parse_line("A \"art/x/1.dds\" 0 0 1 1").is_err());
        assert!(parse_line("\"A \"art/x/1.dds\" 0 0 1 1").is_err());
        assert!(parse_line("\"A\" art/x/1.dds 0 0 1 1").is_err());
    }

    #[test]
    fn test_parse_line_bad_coordinates() {
        assert!(parse_line("\"A\" \"art/x/1.dds\" 0 0 ten 1").is_err());
        assert!(parse_line("\"A\" \"art/x/1.dds\" 0 0 1").is_err());
        assert!(parse_line("\"A\" \"art/x/1.dds\"").is_err());
    }
}

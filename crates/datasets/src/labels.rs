//! Region names from FSL atlas XML descriptions
//!
//! The FSL files are simple enough that a full XML parser is overkill. Every
//! region is a single element, listed in index order:
//!
//! ```text
//! <data>
//! <label index="0" x="48" y="94" z="35">Frontal Pole</label>
//! <label index="1" x="86" y="184" z="31">Insular Cortex</label>
//! ...
//! </data>
//! ```

// standard library
use std::path::Path;

// internal modules
use crate::error::{Error, Result};

// nidata modules
use nidata_format::f;

// nom parser combinators
use nom::bytes::complete::{tag, take_until};
use nom::multi::many0;
use nom::sequence::{delimited, preceded, tuple};
use nom::IResult;

/// Read the region names from an FSL atlas XML file
///
/// The files are ISO-8859-1 encoded, which maps directly onto `char`.
pub(crate) fn read_label_file(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path)?;
    let text: String = bytes.iter().map(|b| *b as char).collect();
    parse_labels(&text)
}

/// Every `<label>` element text, in document order
pub(crate) fn parse_labels(xml: &str) -> Result<Vec<String>> {
    let (_, labels) =
        many0(label)(xml).map_err(|e| Error::ParseError(f!("unreadable labels: {e}")))?;

    if labels.is_empty() {
        return Err(Error::ParseError("no <label> elements found".to_string()));
    }

    Ok(labels.into_iter().map(unescape).collect())
}

/// Skip ahead to the next label and take its text
fn label(i: &str) -> IResult<&str, &str> {
    preceded(
        take_until("<label"),
        delimited(
            tuple((tag("<label"), take_until(">"), tag(">"))),
            take_until("</label>"),
            tag("</label>"),
        ),
    )(i)
}

/// Resolve the predefined XML entities
fn unescape(text: &str) -> String {
    text.trim()
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORTICAL: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<atlas version="1.0">
<header>
<name>Harvard-Oxford Cortical Structural Atlas</name>
<type>Probabilistic</type>
<images>
<imagefile>/HarvardOxford/HarvardOxford-cort-prob-2mm</imagefile>
</images>
</header>
<data>
<label index="0" x="48" y="94" z="35">Frontal Pole</label>
<label index="1" x="86" y="184" z="31">Insular Cortex</label>
<label index="44" x="28" y="115" z="44">Heschl&apos;s Gyrus (includes H1 and H2)</label>
</data>
</atlas>
"#;

    #[test]
    fn labels_in_document_order() {
        let labels = parse_labels(CORTICAL).unwrap();
        assert_eq!(
            labels,
            vec![
                "Frontal Pole",
                "Insular Cortex",
                "Heschl's Gyrus (includes H1 and H2)"
            ]
        );
    }

    #[test]
    fn no_labels_is_an_error() {
        assert!(parse_labels("<atlas><data></data></atlas>").is_err());
    }

    #[test]
    fn latin1_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.xml");
        // "Région" with a single latin-1 byte for the accent
        std::fs::write(&path, b"<data><label index=\"0\">R\xe9gion</label></data>").unwrap();
        assert_eq!(read_label_file(&path).unwrap(), vec!["R\u{e9}gion"]);
    }
}

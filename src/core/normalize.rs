//! Record normalization for OSM API 0.6 XML payloads
//!
//! `parse_raw` turns text into an XML tree; `normalize` turns the tree into an
//! [`Entity`]. Neither performs I/O.

use roxmltree::{Document, Node as XmlNode};

use crate::core::entity::{Coord, Entity, EntityKind, Member, Node, Relation, Tags, Way};
use crate::core::error::{FetchError, ParseError};

/// Parse a raw API response into an XML tree
pub fn parse_raw(text: &str) -> Result<Document<'_>, ParseError> {
    Ok(Document::parse(text)?)
}

/// Convert a parsed `<osm>` document into the first entity it contains
pub fn normalize(doc: &Document<'_>) -> Result<Entity, FetchError> {
    let root = doc.root_element();
    if !root.has_tag_name("osm") {
        return Err(FetchError::Malformed(format!(
            "expected <osm> root, found <{}>",
            root.tag_name().name()
        )));
    }

    let element = root
        .children()
        .filter(XmlNode::is_element)
        .find(|el| el.tag_name().name().parse::<EntityKind>().is_ok())
        .ok_or_else(|| FetchError::Malformed("no node, way or relation in payload".to_string()))?;

    let id = parse_id(&element, "id")?;
    let tags = parse_tags(&element);

    match element.tag_name().name() {
        "node" => {
            let lon = parse_float(&element, "lon")?;
            let lat = parse_float(&element, "lat")?;
            Ok(Entity::Node(Node { id, tags, coords: Coord::new(lon, lat) }))
        }
        "way" => {
            let node_ids = element
                .children()
                .filter(|c| c.has_tag_name("nd"))
                .map(|nd| parse_id(&nd, "ref"))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Entity::Way(Way { id, tags, node_ids }))
        }
        _ => {
            let members = element
                .children()
                .filter(|c| c.has_tag_name("member"))
                .map(|m| parse_member(&m))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Entity::Relation(Relation { id, tags, members }))
        }
    }
}

/// Parse and normalize in one step
pub fn normalize_str(text: &str) -> Result<Entity, FetchError> {
    let doc = parse_raw(text)?;
    normalize(&doc)
}

fn parse_tags(element: &XmlNode<'_, '_>) -> Tags {
    element
        .children()
        .filter(|c| c.has_tag_name("tag"))
        .filter_map(|tag| Some((tag.attribute("k")?.to_string(), tag.attribute("v")?.to_string())))
        .collect()
}

fn parse_member(member: &XmlNode<'_, '_>) -> Result<Member, FetchError> {
    let kind = member
        .attribute("type")
        .ok_or_else(|| FetchError::Malformed("member without type".to_string()))?
        .parse::<EntityKind>()
        .map_err(FetchError::Malformed)?;

    Ok(Member {
        kind,
        id: parse_id(member, "ref")?,
        role: member.attribute("role").unwrap_or_default().to_string(),
    })
}

fn parse_id(element: &XmlNode<'_, '_>, attr: &str) -> Result<u64, FetchError> {
    let raw = element.attribute(attr).ok_or_else(|| {
        FetchError::Malformed(format!("<{}> without {attr}", element.tag_name().name()))
    })?;
    raw.parse()
        .map_err(|_| FetchError::Malformed(format!("invalid {attr} '{raw}'")))
}

fn parse_float(element: &XmlNode<'_, '_>, attr: &str) -> Result<f64, FetchError> {
    let raw = element.attribute(attr).ok_or_else(|| {
        FetchError::Malformed(format!("<{}> without {attr}", element.tag_name().name()))
    })?;
    raw.parse()
        .map_err(|_| FetchError::Malformed(format!("invalid {attr} '{raw}'")))
}

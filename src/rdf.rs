//! Decoding of `exiftool -X` output.
//!
//! exiftool prints one `rdf:Description` per file inside an `rdf:RDF`
//! root. Tags are child elements named `Group:TagName`; list tags are
//! wrapped in `rdf:Bag`/`rdf:Seq`/`rdf:Alt` containers of `rdf:li` items.

use crate::error::{AppError, AppResult};
use crate::value::{TagMap, TagValue};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> AppResult<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            attrs.push((key, attr.unescape_value()?.into_owned()));
        }
        Ok(Self {
            name,
            attrs,
            ..Default::default()
        })
    }

    fn local_name(&self) -> &str {
        local_name(&self.name)
    }
}

fn local_name(qualified: &str) -> &str {
    qualified.rsplit(':').next().unwrap_or(qualified)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> AppResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(AppError::Parse(format!(
                "document has more than one root element, found <{}>",
                element.name
            )));
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn parse_tree(xml: &str) -> AppResult<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element)?;
                }
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(AppError::Parse(format!(
            "unclosed element <{}>",
            stack[stack.len() - 1].name
        )));
    }
    root.ok_or_else(|| AppError::Parse("document has no root element".to_string()))
}

fn element_value(element: &Element) -> TagValue {
    let text = element.text.trim();
    if element.children.is_empty() && element.attrs.is_empty() {
        return if text.is_empty() {
            TagValue::Null
        } else {
            TagValue::Text(text.to_string())
        };
    }

    let mut grouped: BTreeMap<String, Vec<TagValue>> = BTreeMap::new();
    for child in &element.children {
        grouped
            .entry(child.local_name().to_string())
            .or_default()
            .push(element_value(child));
    }

    let mut fields: BTreeMap<String, TagValue> = grouped
        .into_iter()
        .map(|(key, mut values)| {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                TagValue::List(values)
            };
            (key, value)
        })
        .collect();

    for (key, value) in &element.attrs {
        fields.insert(format!("@{}", key), TagValue::Text(value.clone()));
    }
    if !text.is_empty() {
        fields.insert("#text".to_string(), TagValue::Text(text.to_string()));
    }
    TagValue::Struct(fields)
}

fn is_element_key(key: &str) -> bool {
    !key.starts_with('@') && key != "#text"
}

/// Strip single-child containers (`Bag` > `li`) down to the terminal value.
fn unnest(value: TagValue) -> TagValue {
    match value {
        TagValue::Struct(mut fields)
            if fields.len() == 1 && fields.keys().all(|k| is_element_key(k)) =>
        {
            match fields.pop_first() {
                Some((_, inner)) => unnest(inner),
                None => TagValue::Struct(fields),
            }
        }
        other => other,
    }
}

fn description_tags(description: &Element) -> TagMap {
    let mut tags = TagMap::new();
    for (key, value) in &description.attrs {
        tags.insert(key.clone(), TagValue::Text(value.clone()));
    }
    for child in &description.children {
        let value = unnest(element_value(child));
        if let Some(previous) = tags.insert(child.local_name().to_string(), value) {
            log::trace!(
                "Tag {} appears in several groups, replacing {:?}",
                child.name,
                previous
            );
        }
    }
    tags
}

/// One tag map per `rdf:Description`, in document order.
pub fn parse_exiftool_xml(xml: &str) -> AppResult<Vec<TagMap>> {
    let root = parse_tree(xml)?;
    if root.local_name() != "RDF" {
        return Err(AppError::Parse(format!(
            "expected rdf:RDF root, found <{}>",
            root.name
        )));
    }

    Ok(root
        .children
        .iter()
        .filter(|child| child.local_name() == "Description")
        .map(description_tags)
        .collect())
}

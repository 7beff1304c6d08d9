use crate::Error;
use std::io::Read;
use xml::attribute::OwnedAttribute;
use xml::reader::{EventReader, ParserConfig, XmlEvent};

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feed {
    pub title:   String,
    pub id:      String,
    pub links:   Vec<Link>,
    pub updated: String,
    pub entries: Vec<Entry>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entry {
    pub title:   String,
    pub id:      String,
    pub links:   Vec<Link>,
    pub updated: String,
    pub content: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Link {
    pub rel:  String,
    pub href: String,
}

impl Link {
    fn from_attributes(attributes: &[OwnedAttribute]) -> Self {
        let mut link = Self::default();
        for attribute in attributes {
            match &attribute.name.local_name[..] {
                "rel" => link.rel = attribute.value.clone(),
                "href" => link.href = attribute.value.clone(),
                _ => {},
            }
        }
        link
    }
}

// Text-valued children shared by <feed> and <entry>.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Field {
    Title,
    Id,
    Updated,
    Content,
}

impl Field {
    fn by_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "id" => Some(Self::Id),
            "updated" => Some(Self::Updated),
            "content" => Some(Self::Content),
            _ => None,
        }
    }
}

impl Feed {
    /// Deserializes an Atom document. Empty input is refused before any parsing happens.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.is_empty() { return Err(Error::EmptyInput); }
        Self::from_reader(bytes)
    }

    pub fn from_reader<R: Read>(source: R) -> Result<Self, Error> {
        let config = ParserConfig::new()
            .whitespace_to_characters(true)
            .cdata_to_characters(true);
        let mut parser = EventReader::new_with_config(source, config);
        let mut feed = Feed::default();
        let mut entry: Option<Entry> = None;
        // (field, accumulated text, depth of the element that owns the text)
        let mut text: Option<(Field, String, usize)> = None;
        let mut depth = 0;
        loop {
            match parser.next()? {
                XmlEvent::StartElement { name, attributes, .. } => {
                    depth += 1;
                    let local = &name.local_name[..];
                    if depth == 1 {
                        if local != "feed" || name.namespace.as_deref() != Some(ATOM_NS) {
                            return Err(Error::UnexpectedRoot(name.to_string()));
                        }
                    } else if depth == 2 && local == "entry" {
                        entry = Some(Entry::default());
                    } else if depth == 2 || (depth == 3 && entry.is_some()) {
                        if local == "link" {
                            let link = Link::from_attributes(&attributes);
                            match entry.as_mut() {
                                Some(entry) if depth == 3 => entry.links.push(link),
                                _ => feed.links.push(link),
                            }
                        } else if let Some(field) = Field::by_name(local) {
                            text = Some((field, String::new(), depth));
                        }
                    }
                },
                XmlEvent::Characters(string) => {
                    if let Some((_, buffer, owner)) = text.as_mut() {
                        // only character data directly inside the field counts
                        if *owner == depth { buffer.push_str(&string); }
                    }
                },
                XmlEvent::EndElement { .. } => {
                    if let Some((field, value, owner)) = text.take() {
                        if owner == depth {
                            match entry.as_mut() {
                                Some(entry) if depth == 3 => entry.set(field, value),
                                _ => feed.set(field, value),
                            }
                        } else {
                            text = Some((field, value, owner));
                        }
                    }
                    if depth == 2 {
                        if let Some(entry) = entry.take() { feed.entries.push(entry); }
                    }
                    depth -= 1;
                    if depth == 0 { break; }
                },
                XmlEvent::EndDocument => break,
                _ => {},
            }
        }
        Ok(feed)
    }

    fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Title => self.title = value,
            Field::Id => self.id = value,
            Field::Updated => self.updated = value,
            // <feed> has no content of its own
            Field::Content => {},
        }
    }
}

impl Entry {
    fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Title => self.title = value,
            Field::Id => self.id = value,
            Field::Updated => self.updated = value,
            Field::Content => self.content = value,
        }
    }
}

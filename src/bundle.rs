use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::parser::base_path;
use crate::settings::Settings;

const PLIST_DOCTYPE: &str =
    r#"plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd""#;

/// On-disk layout of `<name>.docset`.
pub struct Bundle {
    root: PathBuf,
}

impl Bundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.root.join("Contents/Resources/Documents")
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("Contents/Resources/docSet.dsidx")
    }

    pub fn plist_path(&self) -> PathBuf {
        self.root.join("Contents/Info.plist")
    }

    pub fn icon_path(&self) -> PathBuf {
        self.root.join("icon.png")
    }

    pub fn create(&self) -> Result<()> {
        let docs = self.documents_dir();
        fs::create_dir_all(&docs).with_context(|| format!("Failed to create {:?}", docs))
    }

    pub fn write_info_plist(&self, settings: &Settings) -> Result<()> {
        let xml = render_info_plist(settings)?;
        let path = self.plist_path();
        fs::write(&path, xml).with_context(|| format!("Failed to write {:?}", path))
    }
}

enum Value<'a> {
    Str(&'a str),
    Bool(bool),
}

fn render_info_plist(settings: &Settings) -> Result<Vec<u8>> {
    let platform = settings.name.to_lowercase();
    let index_file = base_path(&settings.index_page).unwrap_or(&settings.index_page);
    let entries = [
        ("CFBundleIdentifier", Value::Str(&settings.name)),
        ("CFBundleName", Value::Str(&settings.name)),
        ("DocSetPlatformFamily", Value::Str(&platform)),
        ("DashDocSetFamily", Value::Str(&settings.family)),
        ("isDashDocset", Value::Bool(true)),
        ("isJavaScriptEnabled", Value::Bool(true)),
        ("dashIndexFilePath", Value::Str(index_file)),
    ];

    let mut w = Writer::new_with_indent(Vec::new(), b'\t', 1);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    w.write_event(Event::DocType(BytesText::from_escaped(PLIST_DOCTYPE)))?;
    w.write_event(Event::Start(
        BytesStart::new("plist").with_attributes([("version", "1.0")]),
    ))?;
    w.write_event(Event::Start(BytesStart::new("dict")))?;
    for (key, value) in entries {
        write_text_element(&mut w, "key", key)?;
        match value {
            Value::Str(s) => write_text_element(&mut w, "string", s)?,
            Value::Bool(true) => w.write_event(Event::Empty(BytesStart::new("true")))?,
            Value::Bool(false) => w.write_event(Event::Empty(BytesStart::new("false")))?,
        }
    }
    w.write_event(Event::End(BytesEnd::new("dict")))?;
    w.write_event(Event::End(BytesEnd::new("plist")))?;

    let mut xml = w.into_inner();
    xml.push(b'\n');
    Ok(xml)
}

fn write_text_element(w: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(tag)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Read the flat `<dict>` of an Info.plist back as (key, value) pairs.
/// Booleans come back as "true"/"false".
pub fn read_info_plist(path: &Path) -> Result<Vec<(String, String)>> {
    let xml = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let mut reader = quick_xml::Reader::from_str(&xml);
    let mut pairs = Vec::new();
    let mut key: Option<String> = None;
    let mut in_key = false;
    let mut in_string = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"key" => in_key = true,
                b"string" => in_string = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                let value = match e.name().as_ref() {
                    b"true" => Some("true"),
                    b"false" => Some("false"),
                    b"string" => Some(""),
                    _ => None,
                };
                if let (Some(v), Some(k)) = (value, key.take()) {
                    pairs.push((k, v.to_string()));
                }
            }
            Ok(Event::Text(e)) if in_key => {
                key = Some(e.unescape()?.to_string());
            }
            Ok(Event::Text(e)) if in_string => {
                if let Some(k) = key.take() {
                    pairs.push((k, e.unescape()?.to_string()));
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"key" => in_key = false,
                b"string" => in_string = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(pairs)
}

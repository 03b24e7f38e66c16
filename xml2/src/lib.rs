use anyhow::Context;

mod template;
pub use template::Template;

/// The key under which an element's attributes are collected.
pub const ATTRIBUTES_KEY: &str = "@";

/// The key under which an element's text is stored when the element also has attributes or child elements.
pub const CHARACTER_DATA_KEY: &str = "#";

/// An XML element converted into plain nested data.
///
/// - An element with neither attributes nor child elements is `Text`.
/// - Any other element is a `Map` of its child elements by local name, plus [`ATTRIBUTES_KEY`] and [`CHARACTER_DATA_KEY`] entries.
/// - Sibling elements with the same name are collected into a `List`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
	Text(String),
	Map(std::collections::BTreeMap<String, Value>),
	List(Vec<Value>),
}

impl Value {
	pub fn get(&self, key: &str) -> Option<&Value> {
		match self {
			Value::Map(map) => map.get(key),
			_ => None,
		}
	}

	/// The text of this element, either because it is `Text` or from its [`CHARACTER_DATA_KEY`] entry.
	pub fn text(&self) -> Option<&str> {
		match self {
			Value::Text(text) => Some(text),
			Value::Map(map) => match map.get(CHARACTER_DATA_KEY) {
				Some(Value::Text(text)) => Some(text),
				_ => None,
			},
			Value::List(_) => None,
		}
	}

	pub fn get_text(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(Value::text)
	}

	/// Normalizes a value that may hold one element or many into a sequence.
	pub fn items(&self) -> Vec<&Value> {
		match self {
			Value::List(items) => items.iter().collect(),
			value => vec![value],
		}
	}
}

/// Parses an XML document into the [`Value`] of its root element.
pub fn parse(xml: &str) -> anyhow::Result<Value> {
	let xml = xml.trim_start_matches('\u{feff}');

	let mut reader = quick_xml::Reader::from_str(xml);
	reader.config_mut().trim_text(true);

	let mut stack: Vec<Element> = vec![];
	let mut root = None;

	loop {
		let event = reader.read_event().with_context(|| format!("could not parse XML at position {}", reader.buffer_position()))?;
		match event {
			quick_xml::events::Event::Start(start) => stack.push(Element::new(&start)?),

			quick_xml::events::Event::Empty(start) => {
				let element = Element::new(&start)?;
				attach(&mut stack, &mut root, element)?;
			},

			quick_xml::events::Event::End(_) => {
				let element = stack.pop().context("could not parse XML: unbalanced end tag")?;
				attach(&mut stack, &mut root, element)?;
			},

			quick_xml::events::Event::Text(text) =>
				if let Some(element) = stack.last_mut() {
					element.text.push_str(&text.unescape().context("could not parse XML text")?);
				},

			quick_xml::events::Event::CData(cdata) =>
				if let Some(element) = stack.last_mut() {
					element.text.push_str(std::str::from_utf8(&cdata).context("could not parse XML CDATA")?);
				},

			quick_xml::events::Event::Eof => break,

			_ => (),
		}
	}

	if let Some(element) = stack.last() {
		return Err(anyhow::anyhow!("could not parse XML: element {} is not closed", element.name));
	}

	root.context("could not parse XML: document has no root element")
}

struct Element {
	name: String,
	attributes: std::collections::BTreeMap<String, Value>,
	text: String,
	children: Vec<(String, Value)>,
}

impl Element {
	fn new(start: &quick_xml::events::BytesStart<'_>) -> anyhow::Result<Self> {
		let name = std::str::from_utf8(start.local_name().as_ref()).context("XML element name is not valid UTF-8")?.to_owned();

		let mut attributes = std::collections::BTreeMap::new();
		for attribute in start.attributes() {
			let attribute = attribute.with_context(|| format!("could not parse attribute of XML element {name}"))?;
			let key = std::str::from_utf8(attribute.key.as_ref()).context("XML attribute name is not valid UTF-8")?.to_owned();
			let value = attribute.unescape_value().with_context(|| format!("could not parse attribute {key} of XML element {name}"))?;
			attributes.insert(key, Value::Text(value.into_owned()));
		}

		Ok(Element {
			name,
			attributes,
			text: String::new(),
			children: vec![],
		})
	}

	fn into_value(self) -> (String, Value) {
		let Element { name, attributes, text, children } = self;

		if attributes.is_empty() && children.is_empty() {
			return (name, Value::Text(text));
		}

		let mut map = std::collections::BTreeMap::new();

		if !attributes.is_empty() {
			map.insert(ATTRIBUTES_KEY.to_owned(), Value::Map(attributes));
		}

		if !text.is_empty() {
			map.insert(CHARACTER_DATA_KEY.to_owned(), Value::Text(text));
		}

		for (child_name, child) in children {
			match map.entry(child_name) {
				std::collections::btree_map::Entry::Vacant(entry) => {
					entry.insert(child);
				},

				std::collections::btree_map::Entry::Occupied(mut entry) => match entry.get_mut() {
					Value::List(items) => items.push(child),
					existing => {
						let first = std::mem::replace(existing, Value::List(vec![]));
						*existing = Value::List(vec![first, child]);
					},
				},
			}
		}

		(name, Value::Map(map))
	}
}

fn attach(stack: &mut [Element], root: &mut Option<Value>, element: Element) -> anyhow::Result<()> {
	let (name, value) = element.into_value();

	if let Some(parent) = stack.last_mut() {
		parent.children.push((name, value));
	}
	else if root.is_some() {
		return Err(anyhow::anyhow!("could not parse XML: more than one root element"));
	}
	else {
		*root = Some(value);
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::Value;

	#[test]
	fn character_data_of_root_with_attributes() {
		let value = super::parse("\u{feff}<ServerName xmlns=\"http://schemas.microsoft.com/sqlazure/2010/12/\">npm0lusisu</ServerName>").unwrap();
		assert_eq!(value.text(), Some("npm0lusisu"));
		assert_eq!(
			value.get(super::ATTRIBUTES_KEY).and_then(|attributes| attributes.get_text("xmlns")),
			Some("http://schemas.microsoft.com/sqlazure/2010/12/"),
		);
	}

	#[test]
	fn single_child() {
		let value = super::parse(
			"\u{feff}<Servers xmlns=\"http://schemas.microsoft.com/sqlazure/2010/12/\">\r\n  <Server>\r\n    <Name>npm0lusisu</Name>\r\n    <AdministratorLogin>foo</AdministratorLogin>\r\n    <Location>North Central US</Location>\r\n  </Server>\r\n</Servers>",
		).unwrap();

		let servers = value.get("Server").unwrap().items();
		assert_eq!(servers.len(), 1);
		assert_eq!(servers[0].get_text("Name"), Some("npm0lusisu"));
		assert_eq!(servers[0].get_text("AdministratorLogin"), Some("foo"));
		assert_eq!(servers[0].get_text("Location"), Some("North Central US"));

		// Whitespace between elements is not character data.
		assert_eq!(value.text(), None);
	}

	#[test]
	fn repeated_children_become_list() {
		let value = super::parse("<Servers><Server><Name>a</Name></Server><Other/><Server><Name>b</Name></Server></Servers>").unwrap();

		let names: Vec<_> = value.get("Server").unwrap().items().into_iter().map(|server| server.get_text("Name")).collect();
		assert_eq!(names, [Some("a"), Some("b")]);
		assert_eq!(value.get("Other"), Some(&Value::Text(String::new())));
	}

	#[test]
	fn escapes_and_cdata() {
		let value = super::parse("<Rule><Name>a &amp; b</Name><Note><![CDATA[<raw>]]></Note></Rule>").unwrap();
		assert_eq!(value.get_text("Name"), Some("a & b"));
		assert_eq!(value.get_text("Note"), Some("<raw>"));
	}

	#[test]
	fn namespace_prefixes_are_dropped_from_element_names() {
		let value = super::parse("<a:Root xmlns:a=\"urn:a\"><a:Child>x</a:Child></a:Root>").unwrap();
		assert_eq!(value.get_text("Child"), Some("x"));
	}

	#[test]
	fn malformed() {
		assert!(super::parse("").is_err());
		assert!(super::parse("<Servers><Server></Servers>").is_err());
		assert!(super::parse("<Servers>").is_err());
		assert!(super::parse("<a/><b/>").is_err());
	}
}

use anyhow::Context;

/// An XML document with `<%= name %>` placeholders.
///
/// Parameter values are XML-escaped when rendered.
#[derive(Debug)]
pub struct Template {
	segments: Vec<Segment>,
}

#[derive(Debug)]
enum Segment {
	Literal(String),
	Parameter(String),
}

const PLACEHOLDER_START: &str = "<%=";
const PLACEHOLDER_END: &str = "%>";

impl Template {
	pub fn parse(source: &str) -> anyhow::Result<Self> {
		let mut segments = vec![];
		let mut rest = source;

		while let Some(start) = rest.find(PLACEHOLDER_START) {
			let (literal, placeholder) = rest.split_at(start);
			if !literal.is_empty() {
				segments.push(Segment::Literal(literal.to_owned()));
			}

			let placeholder = &placeholder[PLACEHOLDER_START.len()..];
			let end = placeholder.find(PLACEHOLDER_END).context("template placeholder is not terminated")?;
			let name = placeholder[..end].trim();
			if name.is_empty() {
				return Err(anyhow::anyhow!("template placeholder has no parameter name"));
			}
			segments.push(Segment::Parameter(name.to_owned()));

			rest = &placeholder[(end + PLACEHOLDER_END.len())..];
		}

		if !rest.is_empty() {
			segments.push(Segment::Literal(rest.to_owned()));
		}

		Ok(Template { segments })
	}

	pub fn render(&self, params: &[(&str, &str)]) -> anyhow::Result<String> {
		let mut result = String::new();

		for segment in &self.segments {
			match segment {
				Segment::Literal(literal) => result.push_str(literal),

				Segment::Parameter(name) => {
					let (_, value) =
						params.iter()
						.find(|(param_name, _)| *param_name == name.as_str())
						.with_context(|| format!("template parameter {name} is not set"))?;
					result.push_str(&quick_xml::escape::escape(*value));
				},
			}
		}

		Ok(result)
	}
}

use std::cmp::Ordering;
use std::fmt::Debug;
use std::iter::Peekable;
use anyhow::{anyhow, Context, Result};

pub(crate) trait Line: Debug {
	fn get_idents(&self) -> usize;
	fn get_line_number(&self) -> usize;
}

pub(super) struct WithMoreIdentIter<'a, I: Iterator> {
	depth: usize,
	iter: &'a mut Peekable<I>,
}

impl<'a, I, L> WithMoreIdentIter<'a, I>
where
	I: Iterator<Item=Result<L>>,
	L: Line,
{
	pub(super) fn new(iter: &'a mut Peekable<I>) -> WithMoreIdentIter<'a, I> {
		WithMoreIdentIter { depth: 0, iter }
	}

	pub(super) fn next_level(&mut self) -> WithMoreIdentIter<'_, I> {
		WithMoreIdentIter {
			depth: self.depth + 1,
			iter: self.iter,
		}
	}

	pub(super) fn on_every_line(mut self, mut f: impl FnMut(&mut Self, L) -> Result<()>) -> Result<()> {
		while let Some(line) = self.next() {
			let line = line?;
			let line_number = line.get_line_number();

			f(&mut self, line)
				.with_context(|| anyhow!("in line {line_number}"))?;
		}
		Ok(())
	}

	/// Consumes all lines indented deeper than the current level, used for skipping sections we don't know.
	pub(super) fn skip_deeper(&mut self) -> Result<()> {
		while let Some(line) = self.iter.peek() {
			match line {
				Ok(line) if line.get_idents() > self.depth => {
					self.iter.next();
				},
				Ok(_) => break,
				Err(_) => {
					return self.iter.next()
						.context("peeked error vanished")?
						.map(|_| ());
				},
			}
		}
		Ok(())
	}
}

impl<I, L> Iterator for WithMoreIdentIter<'_, I>
where
	I: Iterator<Item=Result<L>>,
	L: Line,
{
	type Item = Result<L>;

	fn next(&mut self) -> Option<Self::Item> {
		match self.iter.peek()? {
			Ok(line) => {
				match line.get_idents().cmp(&self.depth) {
					Ordering::Less => None, // cancel an inner loop
					Ordering::Equal => self.iter.next(), // actually give back the value
					Ordering::Greater => Some(Err(anyhow!("expected an indentation of {} for line {}: {:#?}", self.depth, line.get_line_number(), line))),
				}
			},
			Err(_) => self.iter.next(),
		}
	}
}

/// Unescapes a string escaped in the tiny v2 way: `\\`, `\n`, `\r`, `\t` and `\0`.
pub(crate) fn unescape(string: &str) -> Result<String> {
	if !string.contains('\\') {
		return Ok(string.to_owned());
	}

	let mut out = String::with_capacity(string.len());
	let mut chars = string.chars();
	while let Some(ch) = chars.next() {
		if ch == '\\' {
			let escaped = chars.next()
				.with_context(|| anyhow!("unterminated escape sequence at the end of {string:?}"))?;
			out.push(match escaped {
				'\\' => '\\',
				'n' => '\n',
				'r' => '\r',
				't' => '\t',
				'0' => '\0',
				other => return Err(anyhow!("unknown escape sequence \\{other} in {string:?}")),
			});
		} else {
			out.push(ch);
		}
	}
	Ok(out)
}

/// The inverse of [`unescape`].
pub(crate) fn escape(string: &str) -> String {
	let mut out = String::with_capacity(string.len());
	for ch in string.chars() {
		match ch {
			'\\' => out.push_str("\\\\"),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			'\t' => out.push_str("\\t"),
			'\0' => out.push_str("\\0"),
			ch => out.push(ch),
		}
	}
	out
}

pub(crate) mod tiny_line {
	use anyhow::{anyhow, bail, Context, Result};
	use crate::lines::{unescape, Line};
	use crate::tree::names::Names;

	#[derive(Debug)]
	pub(crate) struct TinyLine {
		line_number: usize,
		idents: usize,
		pub(crate) first_field: String,
		fields: std::vec::IntoIter<String>,
	}

	impl TinyLine {
		pub(crate) fn new(line_number: usize, line: &str) -> Result<TinyLine> {
			// tabs are a single byte, so the count is also the byte index
			let idents = line.bytes().take_while(|x| *x == b'\t').count();
			let line = &line[idents..];

			let mut fields = line.split('\t').map(|x| x.to_owned());

			let first_field = fields.next()
				.with_context(|| anyhow!("no first field in line {line_number}"))?;

			let vec: Vec<String> = fields.collect();

			Ok(TinyLine {
				line_number,
				idents,
				first_field,
				fields: vec.into_iter(),
			})
		}

		pub(crate) fn next(&mut self) -> Result<String> {
			self.fields.next()
				.with_context(|| anyhow!("expected another field in line {}: {self:?}", self.line_number))
		}

		/// Returns the one remaining field, if there's more remaining than that, this fails.
		pub(crate) fn end(mut self) -> Result<String> {
			let next = self.next()?;

			if !self.fields.as_slice().is_empty() {
				bail!("line {} contained more fields than expected: {self:?}", self.line_number);
			}

			Ok(next)
		}

		pub(crate) fn list_remaining(self) -> Vec<String> {
			self.fields.collect()
		}

		/// Returns the remaining fields, checking that there are exactly `len` of them.
		pub(crate) fn list(self, len: usize) -> Result<Vec<String>> {
			let vec: Vec<String> = self.fields.collect();

			if vec.len() != len {
				bail!("line {} contained more or less fields ({}) than the expected {len}: {:?}", self.line_number, vec.len(), vec);
			}

			Ok(vec)
		}

		/// Reads the remaining fields as names, one for each of the `len` namespaces. Empty fields are absent names.
		pub(crate) fn into_names<T>(self, len: usize, escaped: bool) -> Result<Names<T>>
		where
			T: From<String> + AsRef<str>,
		{
			let line_number = self.line_number;
			let names = self.list(len)?
				.into_iter()
				.map(|name| if escaped { unescape(&name) } else { Ok(name) })
				.map(|name| name.map(T::from))
				.collect::<Result<Vec<T>>>()
				.with_context(|| anyhow!("failed to read names on line {line_number}"))?;

			Ok(Names::from(names))
		}
	}

	impl Line for TinyLine {
		fn get_idents(&self) -> usize {
			self.idents
		}
		fn get_line_number(&self) -> usize {
			self.line_number
		}
	}
}

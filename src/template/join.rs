//! Joining independently indexed templates into one

use tracing::debug;

use crate::error::ParseError;
use crate::parser::{render_segments, Placeholder, Segment};

use super::Template;

/// Shift every placeholder index in `segments` by `offset`
fn renumber(segments: &mut [Segment], offset: usize) {
    if offset == 0 {
        return;
    }

    let mut markers: Vec<&mut Placeholder> = segments
        .iter_mut()
        .filter_map(|segment| match segment {
            Segment::Placeholder(p) => Some(p),
            Segment::Text(_) => None,
        })
        .collect();

    // Highest index first; each marker is rewritten exactly once
    markers.sort_by(|a, b| b.index.cmp(&a.index));
    for marker in markers {
        marker.index += offset;
    }
}

/// Join templates with `separator`, renumbering placeholders so the result
/// indexes one combined argument list
///
/// The separator is literal text; braces in it are escaped. An empty input
/// yields [`Template::empty`].
///
/// ```rust
/// use sql_compositor::{join, sql};
///
/// let columns = join([sql!("{0:id}", "A"), sql!("{0:value}", 1)], ", ").unwrap();
/// assert_eq!(columns.text(), "{0:id}, {1:value}");
/// assert_eq!(columns.args().len(), 2);
/// ```
pub fn join<I>(templates: I, separator: &str) -> Result<Template, ParseError>
where
    I: IntoIterator<Item = Template>,
{
    let separator = render_segments(&[Segment::Text(separator.to_string())]);
    let mut text = String::new();
    let mut args = Vec::new();
    let mut fragments = 0;

    for template in templates {
        let mut segments = template.segments()?;
        renumber(&mut segments, args.len());

        if fragments > 0 {
            text.push_str(&separator);
        }
        text.push_str(&render_segments(&segments));

        let (_, fragment_args) = template.into_parts();
        args.extend(fragment_args);
        fragments += 1;
    }

    debug!(fragments, arguments = args.len(), "joined templates");
    Ok(Template::new(text, args))
}

/// Map each item to a template, then [`join`] the results
pub fn concat_map<T, I, F>(items: I, separator: &str, f: F) -> Result<Template, ParseError>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Template,
{
    join(items.into_iter().map(f), separator)
}

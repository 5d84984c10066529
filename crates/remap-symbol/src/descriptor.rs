//! Descriptor rewriting
//!
//! Field and method descriptors embed class names as `L<internal name>;`.
//! The helpers here rewrite those embedded names through a caller supplied
//! mapping, leaving primitives, arrays and parameter list markers untouched.

/// Rewrite every class reference inside a descriptor
///
/// `map` receives each embedded internal name and returns the replacement,
/// or `None` to keep the name as is.
///
/// # Example
/// ```
/// use remap_symbol::descriptor::map_descriptor;
///
/// let out = map_descriptor("(La/Old;I)[La/Old;", |name| {
///     (name == "a/Old").then_some("b/New")
/// });
/// assert_eq!(out, "(Lb/New;I)[Lb/New;");
/// ```
#[must_use]
pub fn map_descriptor<F, S>(descriptor: &str, mut map: F) -> String
where
    F: FnMut(&str) -> Option<S>,
    S: AsRef<str>,
{
    let mut out = String::with_capacity(descriptor.len());
    let mut rest = descriptor;
    while let Some(start) = rest.find('L') {
        out.push_str(&rest[..=start]);
        let tail = &rest[start + 1..];
        match tail.find(';') {
            Some(end) => {
                let name = &tail[..end];
                match map(name) {
                    Some(mapped) => out.push_str(mapped.as_ref()),
                    None => out.push_str(name),
                }
                out.push(';');
                rest = &tail[end + 1..];
            }
            None => {
                rest = tail;
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Rewrite a type operand as found in `new`, `checkcast` or class constants
///
/// Array types are written as descriptors (`[La/B;`), everything else is a
/// plain internal name.
#[must_use]
pub fn map_type_operand<F, S>(operand: &str, mut map: F) -> String
where
    F: FnMut(&str) -> Option<S>,
    S: AsRef<str>,
{
    if operand.starts_with('[') {
        map_descriptor(operand, map)
    } else {
        match map(operand) {
            Some(mapped) => mapped.as_ref().to_string(),
            None => operand.to_string(),
        }
    }
}

/// Internal names of every class referenced by a descriptor, in order
#[must_use]
pub fn referenced_classes(descriptor: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = descriptor;
    while let Some(start) = rest.find('L') {
        let tail = &rest[start + 1..];
        match tail.find(';') {
            Some(end) => {
                found.push(&tail[..end]);
                rest = &tail[end + 1..];
            }
            None => break,
        }
    }
    found
}

//! Documentation conventions layered on top of the extracted catalog.
//!
//! The specification counts some parameters as required that the
//! documentation (and every engine) treats as optional, usually because the
//! algorithm handles `undefined` specially. Each entry below moves the last
//! `count` required parameters of a callable to the optional side.

use escheck_core::{Catalog, GlobalEntity, Parameters};

/// `(callable, count)` pairs. Bare capitalized names are constructors;
/// everything else is a method or function name without the parentheses.
pub const OPTIONAL_PARAMETERS: &[(&str, u32)] = &[
    ("AggregateError", 1),                       // message
    ("Array.prototype.join", 1),                 // separator
    ("Array.prototype.slice", 2),                // start, end
    ("Array.prototype.sort", 1),                 // compareFn
    ("Array.prototype.splice", 1),               // deleteCount
    ("Array.prototype.toSorted", 1),             // compareFn
    ("Array.prototype.toSpliced", 1),            // deleteCount
    ("ArrayBuffer.prototype.slice", 2),          // start, end
    ("AsyncGenerator.prototype.next", 1),        // value
    ("AsyncGenerator.prototype.return", 1),      // value
    ("Atomics.wait", 1),                         // timeout
    ("Atomics.waitAsync", 1),                    // timeout
    ("Error", 1),                                // message
    ("EvalError", 1),                            // message
    ("Function.prototype.apply", 1),             // argsArray
    ("Generator.prototype.next", 1),             // value
    ("Generator.prototype.return", 1),           // value
    ("Number.parseInt", 1),                      // radix
    ("Number.prototype.toExponential", 1),       // fractionDigits
    ("Number.prototype.toFixed", 1),             // digits
    ("Number.prototype.toPrecision", 1),         // precision
    ("Object.create", 1),                        // propertiesObject
    ("parseInt", 1),                             // radix
    ("Promise.prototype.then", 1),               // onRejected
    ("RangeError", 1),                           // message
    ("ReferenceError", 1),                       // message
    ("RegExp.prototype[%Symbol.split%]", 1),     // limit
    ("RegExp", 1),                               // flags
    ("SharedArrayBuffer.prototype.slice", 2),    // start, end
    ("String.prototype.slice", 1),               // end
    ("String.prototype.split", 1),               // limit
    ("String.prototype.substr", 1),              // length
    ("String.prototype.substring", 1),           // indexEnd
    ("SyntaxError", 1),                          // message
    ("TypeError", 1),                            // message
    ("URIError", 1),                             // message
];

fn is_constructor_target(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The parameter model a target names, if the catalog has it.
fn parameters_mut<'a>(catalog: &'a mut Catalog, target: &str) -> Option<&'a mut Parameters> {
    if is_constructor_target(target) {
        return match catalog.find_mut(target)? {
            GlobalEntity::Class(class) => class.constructor.as_mut().map(|c| &mut c.parameters),
            _ => None,
        };
    }

    let full = format!("{}()", target);
    if let Some((owner, _)) = target.split_once(".prototype") {
        return match catalog.find_mut(owner)? {
            GlobalEntity::Class(class) => class
                .instance_methods
                .iter_mut()
                .find(|m| m.name == full)
                .map(|m| &mut m.parameters),
            _ => None,
        };
    }
    if let Some((owner, _)) = target.split_once('.') {
        let methods = match catalog.find_mut(owner)? {
            GlobalEntity::Class(class) => &mut class.static_methods,
            GlobalEntity::Namespace(namespace) => &mut namespace.static_methods,
            _ => return None,
        };
        return methods
            .iter_mut()
            .find(|m| m.name == full)
            .map(|m| &mut m.parameters);
    }
    match catalog.find_mut(&full)? {
        GlobalEntity::Function(function) => Some(&mut function.parameters),
        _ => None,
    }
}

/// Move `count` required parameters of `target` to optional.
///
/// Returns `Ok(false)` when the catalog does not know the target.
pub fn make_optional(catalog: &mut Catalog, target: &str, count: u32) -> eyre::Result<bool> {
    let Some(parameters) = parameters_mut(catalog, target) else {
        return Ok(false);
    };
    if parameters.required < count {
        eyre::bail!(
            "Cannot make {} parameters of {} optional: it only has {} required",
            count,
            target,
            parameters.required
        );
    }
    parameters.required -= count;
    parameters.optional += count;
    Ok(true)
}

/// Apply every entry of [`OPTIONAL_PARAMETERS`] to the catalog.
///
/// Targets the catalog does not contain are skipped with a warning, which
/// is expected when checking against a partial specification. Returns how
/// many adjustments were applied.
pub fn apply_documentation_conventions(catalog: &mut Catalog) -> eyre::Result<usize> {
    let mut applied = 0;
    for (target, count) in OPTIONAL_PARAMETERS {
        if make_optional(catalog, target, *count)? {
            applied += 1;
        } else {
            tracing::warn!("Skipping parameter adjustment for unknown callable {}", target);
        }
    }
    tracing::debug!("Applied {} parameter adjustments", applied);
    Ok(applied)
}

use proc_macro::TokenStream;
use quote::quote;
use syn::{LitStr, parse_macro_input};

/// Number of steps in one measure. Mirrors `shakebeat::STEPS_PER_MEASURE`.
const STEPS: usize = 16;

/// Builds a 16-step flag array at compile time from a string literal.
///
/// The literal is parsed and validated during compilation and expands to a
/// plain `[bool; 16]` array expression, so it costs nothing at runtime and can
/// be used in `const` contexts.
///
/// # Format
///
/// - `x`, `X`, `1` or `o` mark a flagged step
/// - `.`, `-`, `0` or `_` mark an empty step
/// - spaces and `|` are separators and are ignored
///
/// Exactly 16 step characters must remain after separators are removed.
///
/// # Examples
///
/// ```ignore
/// use shakebeat::steps;
///
/// // Quarter notes
/// const FOUR: [bool; 16] = steps!("x... x... x... x...");
///
/// // Bar-line separators are fine too
/// let clave = steps!("x..x|..x.|..x.|x...");
/// ```
#[proc_macro]
pub fn steps(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as LitStr);
    let literal = input.value();

    match parse_steps(&literal) {
        Ok(flags) => {
            let expanded = quote! {
                [#(#flags),*]
            };

            TokenStream::from(expanded)
        }
        Err(e) => {
            let error_msg = format!("Invalid step pattern '{}': {}", literal, e);
            let expanded = quote! {
                compile_error!(#error_msg)
            };
            TokenStream::from(expanded)
        }
    }
}

fn parse_step(c: char) -> Result<Option<bool>, String> {
    match c {
        'x' | 'X' | '1' | 'o' => Ok(Some(true)),
        '.' | '-' | '0' | '_' => Ok(Some(false)),
        ' ' | '|' => Ok(None),
        _ => Err(format!("unexpected character '{}'", c)),
    }
}

fn parse_steps(s: &str) -> Result<Vec<bool>, String> {
    if s.trim().is_empty() {
        return Err("empty string".to_string());
    }

    let mut flags = Vec::with_capacity(STEPS);
    for c in s.chars() {
        if let Some(flag) = parse_step(c)? {
            flags.push(flag);
        }
    }

    if flags.len() != STEPS {
        return Err(format!("expected {} steps, found {}", STEPS, flags.len()));
    }

    Ok(flags)
}

//! String helpers.

use std::borrow::Cow;

/// Convert string to camel case.
///
/// This is the fixed transformation used to derive a [`Context`] lookup key
/// from the name of a [`ContextRecord`] field.
///
/// [`Context`]: crate::Context
/// [`ContextRecord`]: crate::ContextRecord
pub fn to_camel_case(s: &'_ str) -> Cow<'_, str> {
    let mut dest = Cow::Borrowed(s);

    // handle '_' to be more friendly with the
    // _var convention for unused variables
    let s_iter = s.strip_prefix('_').unwrap_or(s).split('_').enumerate();

    for (i, part) in s_iter {
        if i == 0 {
            dest = Cow::Borrowed(part);
            continue;
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            dest += Cow::Owned(first.to_uppercase().collect::<String>());
            dest += chars.as_str();
        }
    }

    dest
}

#[test]
fn test_to_camel_case() {
    assert_eq!(&to_camel_case("test")[..], "test");
    assert_eq!(&to_camel_case("_test")[..], "test");
    assert_eq!(&to_camel_case("first_second")[..], "firstSecond");
    assert_eq!(&to_camel_case("first_")[..], "first");
    assert_eq!(&to_camel_case("a_b_c")[..], "aBC");
    assert_eq!(&to_camel_case("a_bc")[..], "aBc");
    assert_eq!(&to_camel_case("a_b")[..], "aB");
    assert_eq!(&to_camel_case("a")[..], "a");
    assert_eq!(&to_camel_case("")[..], "");
    assert_eq!(&to_camel_case("user_id")[..], "userId");
}

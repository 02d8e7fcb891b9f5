//! `.modinfo` entries read by `modpost` and `modinfo(8)`.

/// Places one NUL terminated `tag=value` string per entry in the `.modinfo`
/// section, the layout produced by the kernel's `MODULE_INFO` macro for
/// loadable modules.
macro_rules! modinfo {
    ($($tag:ident: $value:literal),* $(,)?) => {
        $(
            const _: () = {
                const TEXT: &str = concat!(stringify!($tag), "=", $value, "\0");

                #[used]
                #[unsafe(link_section = ".modinfo")]
                static ENTRY: [u8; TEXT.len()] = $crate::modinfo::entry(TEXT);
            };
        )*
    };
}

/// Copies `text` into a fixed-size array so it can be emitted as a static.
pub(crate) const fn entry<const N: usize>(text: &str) -> [u8; N] {
    let bytes = text.as_bytes();
    assert!(bytes.len() == N);
    let mut out = [0; N];
    let mut i = 0;
    while i < N {
        out[i] = bytes[i];
        i += 1;
    }
    out
}

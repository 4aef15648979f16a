#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Photohost UI wasm entry point and native stub fallback.

#[cfg(target_arch = "wasm32")]
fn main() -> Result<(), std::io::Error> {
    photohost_ui::run_app();
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
const NATIVE_HINT: &str = "photohost-ui enhances the photohost dashboard and upload pages in the browser; \
there is nothing to run natively. Build it with `trunk build` or \
`cargo build --target wasm32-unknown-unknown` and load it from those pages.\n";

#[cfg(not(target_arch = "wasm32"))]
fn write_hint(out: &mut impl std::io::Write) -> std::io::Result<()> {
    out.write_all(NATIVE_HINT.as_bytes())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), std::io::Error> {
    write_hint(&mut std::io::stderr().lock())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn native_hint_names_the_pages_and_the_wasm_target() -> std::io::Result<()> {
        let mut out = Vec::new();
        write_hint(&mut out)?;
        let hint = String::from_utf8_lossy(&out);
        assert!(hint.contains("dashboard and upload pages"));
        assert!(hint.contains("wasm32-unknown-unknown"));
        assert!(hint.ends_with('\n'));
        Ok(())
    }

    #[test]
    fn native_main_writes_the_hint() -> std::io::Result<()> {
        main()
    }
}

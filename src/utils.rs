pub fn to_hex_str<T>(bytes: &T) -> String
where
    T: AsRef<[u8]> + ?Sized,
{
    let x = bytes.as_ref();

    x.iter()
        .map(|v| format!("{:02x}", v))
        .collect::<Vec<String>>()
        .join("")
}

/// Filename with its last extension removed, `a.b.pem` becomes `a.b`.
pub fn strip_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(pos) if !filename[pos + 1..].is_empty() && !filename[pos + 1..].contains('/') => {
            &filename[..pos]
        }
        _ => filename,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_hex_str() {
        assert_eq!(to_hex_str(&[0x00, 0x5a, 0xff]), "005aff");
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("server.pem"), "server");
        assert_eq!(strip_extension("my.site.p12"), "my.site");
        assert_eq!(strip_extension("noext"), "noext");
        assert_eq!(strip_extension("dir.d/noext"), "dir.d/noext");
        assert_eq!(strip_extension("trailing."), "trailing.");
    }
}

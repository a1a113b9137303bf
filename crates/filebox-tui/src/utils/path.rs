use std::path::{Path, PathBuf};

/// Expand a leading `~` to the home directory. Anything else is taken as is.
pub fn expand_path(input: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (input, home) {
        ("~", Some(home)) => home,
        (rest, Some(home)) if rest.starts_with("~/") => home.join(&rest[2..]),
        (other, _) => PathBuf::from(other),
    }
}

/// Where a downloaded remote file is written. Only the final component of
/// the remote name is used, so names never escape `dir`.
pub fn download_target(dir: &Path, remote_name: &str) -> PathBuf {
    let local = Path::new(remote_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("download");
    dir.join(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_plain_path() {
        assert_eq!(expand_path("/tmp/a.txt"), PathBuf::from("/tmp/a.txt"));
        assert_eq!(expand_path("rel/a.txt"), PathBuf::from("rel/a.txt"));
        assert_eq!(expand_path("~user/a"), PathBuf::from("~user/a"));
    }

    #[test]
    fn test_expand_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~"), home);
            assert_eq!(expand_path("~/docs/a.txt"), home.join("docs/a.txt"));
        }
    }

    #[test]
    fn test_download_target_stays_in_dir() {
        let dir = Path::new("/downloads");
        assert_eq!(download_target(dir, "a.txt"), dir.join("a.txt"));
        assert_eq!(download_target(dir, "../../etc/passwd"), dir.join("passwd"));
        assert_eq!(download_target(dir, ".."), dir.join("download"));
        assert_eq!(download_target(dir, ""), dir.join("download"));
    }
}

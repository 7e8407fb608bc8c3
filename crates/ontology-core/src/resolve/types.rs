//! Reduce a written type to the class name it refers to.

/// Strip pointers, references, nullability, arrays, generic arguments and
/// optional wrappers: `*Repo`, `Repo?`, `List<Repo>`, `Optional[Repo]`,
/// `Repo | null` and `"Repo"` all become `Repo`, keeping any qualifier
/// (`models.Repo`). Returns `None` for an empty or wildcard type.
pub fn normalize_type_name(raw: &str) -> Option<String> {
    let mut ty = raw.trim();

    // TS unions: first non-nullish member.
    if ty.contains('|') {
        ty = ty
            .split('|')
            .map(str::trim)
            .find(|t| !matches!(*t, "null" | "undefined" | "None" | ""))?;
    }

    ty = ty.trim_matches(|c| c == '"' || c == '\'');
    for prefix in ["readonly ", "ref ", "out ", "in "] {
        if let Some(rest) = ty.strip_prefix(prefix) {
            ty = rest.trim_start();
        }
    }
    ty = ty.trim_start_matches(['*', '&']);
    while let Some(rest) = ty.strip_prefix("[]") {
        ty = rest.trim_start_matches('*');
    }

    // Python `Optional[Repo]` unwraps to the wrapped type.
    if let Some(inner) = ty
        .strip_prefix("Optional[")
        .or_else(|| ty.strip_prefix("typing.Optional["))
        .and_then(|t| t.strip_suffix(']'))
    {
        return normalize_type_name(inner);
    }

    let base = ty
        .split(['<', '['])
        .next()
        .unwrap_or(ty)
        .trim_end_matches('?')
        .trim();
    if base.is_empty() || base == "_" || base == "var" {
        return None;
    }
    Some(base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_type_name() {
        assert_eq!(normalize_type_name("*DB").as_deref(), Some("DB"));
        assert_eq!(normalize_type_name("[]*models.User").as_deref(), Some("models.User"));
        assert_eq!(normalize_type_name("List<User>").as_deref(), Some("List"));
        assert_eq!(normalize_type_name("UserRepository?").as_deref(), Some("UserRepository"));
        assert_eq!(normalize_type_name("Optional[Repo]").as_deref(), Some("Repo"));
        assert_eq!(normalize_type_name("Repo | null").as_deref(), Some("Repo"));
        assert_eq!(normalize_type_name("'Repo'").as_deref(), Some("Repo"));
        assert_eq!(normalize_type_name("string[]").as_deref(), Some("string"));
        assert_eq!(normalize_type_name("var"), None);
        assert_eq!(normalize_type_name("  "), None);
    }
}

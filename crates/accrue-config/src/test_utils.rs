/// Runs `f` with the given environment variables set, restoring the previous
/// values afterwards. `None` removes the variable for the duration.
#[cfg(test)]
pub fn with_env<F>(vars: Vec<(&str, Option<&str>)>, f: F)
where
    F: FnOnce(),
{
    let old_vars: Vec<_> = vars
        .iter()
        .map(|(k, _)| (*k, std::env::var(k).ok()))
        .collect();

    for (key, value) in &vars {
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }

    f();

    for (key, old_value) in old_vars {
        match old_value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }
}

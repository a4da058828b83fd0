use crate::model::NewUser;

pub fn login_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("The login_name must be a non-empty string");
    }

    if name.chars().count() > 64 {
        return Err("The login_name must be at most 64 characters");
    }

    if name.chars().any(|x| x.is_whitespace() || x.is_control()) {
        return Err("The login_name must not contain whitespace");
    }

    Ok(())
}

pub fn registration(user: &NewUser) -> Result<(), &'static str> {
    if [&user.first_name, &user.last_name, &user.password]
        .iter()
        .any(|x| x.trim().is_empty())
    {
        return Err("The first_name, last_name, and password must be non-empty strings");
    }

    login_name(&user.login_name)
}

/// Returns the trimmed comment text.
pub fn comment(text: Option<&str>) -> Result<&str, &'static str> {
    match text.map(str::trim) {
        Some(x) if !x.is_empty() => Ok(x),
        _ => Err("Comment cannot be empty"),
    }
}

#[test]
fn login_name_validation() {
    login_name("took").unwrap();
    login_name("m.smith_2").unwrap();
    login_name("").unwrap_err();
    login_name("two words").unwrap_err();
    login_name("tab\there").unwrap_err();
    login_name("normalname\n").unwrap_err();
    login_name(&"x".repeat(64)).unwrap();
    login_name(&"x".repeat(65)).unwrap_err();
}

#[test]
fn registration_validation() {
    let user = NewUser {
        login_name: "ian".into(),
        password: "weak".into(),
        first_name: "Ian".into(),
        last_name: "Malcolm".into(),
        ..Default::default()
    };
    registration(&user).unwrap();

    registration(&NewUser {
        first_name: "  ".into(),
        ..user.clone()
    })
    .unwrap_err();
    registration(&NewUser {
        password: String::new(),
        ..user.clone()
    })
    .unwrap_err();
    registration(&NewUser {
        login_name: String::new(),
        ..user
    })
    .unwrap_err();
}

#[test]
fn comment_validation() {
    assert_eq!(comment(Some("  nice!  ")), Ok("nice!"));
    comment(Some("   \n\t")).unwrap_err();
    comment(Some("")).unwrap_err();
    comment(None).unwrap_err();
}

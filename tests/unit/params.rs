use super::*;

#[test]
fn query_string_keys_and_aliases() {
    let p = CardParams::from_url("https://cards.example/?name=Alex&bd=May%201").unwrap();
    assert_eq!(p.name, "Alex");
    assert_eq!(p.birth_date, "May 1");

    let p = CardParams::from_url("/?user=Sam+Lee&birthDate=2000-01-02").unwrap();
    assert_eq!(p.name, "Sam Lee");
    assert_eq!(p.birth_date, "2000-01-02");

    let p = CardParams::from_url("/?bd_date=today&bd=").unwrap();
    assert_eq!(p.birth_date, "today");
}

#[test]
fn path_segment_with_doubled_ampersands() {
    let p = CardParams::from_url("/name=Alex&&bd=12%20June").unwrap();
    assert_eq!(p.name, "Alex");
    assert_eq!(p.birth_date, "12 June");
}

#[test]
fn query_takes_priority_over_path() {
    let p = CardParams::from_url("/name=Path&&bd=1?name=Query").unwrap();
    assert_eq!(p.name, "Query");
    // The query string is used in full, even when it lacks the date.
    assert_eq!(p.birth_date, "");
}

#[test]
fn missing_parameters_are_empty() {
    assert_eq!(CardParams::from_url("/").unwrap(), CardParams::default());
    assert_eq!(
        CardParams::from_url("https://cards.example").unwrap(),
        CardParams::default()
    );
    assert_eq!(CardParams::from_query(""), None);
    assert_eq!(CardParams::from_path_segment("/"), None);
}

#[test]
fn values_are_not_validated() {
    let p = CardParams::from_query("name=%3Cb%3E%F0%9F%8E%89&bd=not-a-date").unwrap();
    assert_eq!(p.name, "<b>🎉");
    assert_eq!(p.birth_date, "not-a-date");
}

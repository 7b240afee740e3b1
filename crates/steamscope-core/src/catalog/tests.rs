use super::*;

const CATALOG: &str = "\
AppID,Name,Reviews Total,Reviews Score Fancy,Tags,Launch Price
1,Alpha,100,85%,\"Indie, Action, RPG\",$10.00
2,Beta,200,62%,\"Indie, Action, Puzzle\",$5.00
3,Gamma,900,40%,\"Action, Puzzle\",$20.00
4,Delta,5,30%,\"Indie, Action\",$1.00
5,Epsilon,1500,55%,\"Indie, Puzzle\",Free
6,Zeta,\"2,400\",68%,\"Indie, Strategy\",\"$1,299.99\"
";

fn table() -> CatalogTable {
    CatalogTable::from_reader(CATALOG.as_bytes()).unwrap()
}

fn entry(genre: &str, revenue: f64) -> GenreEntry {
    GenreEntry {
        appid: Some(1),
        title: "t".to_string(),
        genre: genre.to_string(),
        reviews_total: 10,
        launch_price: 1.0,
        estimated_revenue: revenue,
    }
}

#[test]
fn test_parse_launch_price() {
    assert_eq!(parse_launch_price("$19.99"), Some(19.99));
    assert_eq!(parse_launch_price("$1,299.99"), Some(1299.99));
    assert_eq!(parse_launch_price("4,99"), Some(4.99));
    assert_eq!(parse_launch_price("$\u{a0}7.49"), Some(7.49));
    assert_eq!(parse_launch_price("Free"), None);
    assert_eq!(parse_launch_price(""), None);
}

#[test]
fn test_games_filters_reviews_and_required_tag() {
    let cleaner = CatalogCleaner::new(CatalogConfig::default());
    let games = cleaner.games(&table()).unwrap();
    let names: Vec<_> = games.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Beta", "Epsilon", "Zeta"]);

    let zeta = &games[3];
    assert_eq!(zeta.reviews_total, 2400);
    assert_eq!(zeta.review_score, Some(68.0));
    assert_eq!(zeta.launch_price, Some(1299.99));
    assert_eq!(games[2].launch_price, None);
}

#[test]
fn test_missing_column_is_reported() {
    let config = CatalogConfig {
        tags_column: "Genres".to_string(),
        ..Default::default()
    };
    let err = CatalogCleaner::new(config).games(&table()).unwrap_err();
    assert!(matches!(err, CatalogError::MissingColumn(ref c) if c == "Genres"));
}

#[test]
fn test_genre_entries_explode_and_keep_top_genres() {
    let config = CatalogConfig {
        top_genres: 2,
        ..Default::default()
    };
    let cleaner = CatalogCleaner::new(config);
    let games = cleaner.games(&table()).unwrap();
    let entries = cleaner.genre_entries(&games);

    // Epsilon has no price; Action (2) and Puzzle win the tie with RPG and Strategy
    let pairs: Vec<_> = entries.iter().map(|e| (e.title.as_str(), e.genre.as_str())).collect();
    assert_eq!(pairs, vec![("Alpha", "Action"), ("Beta", "Action"), ("Beta", "Puzzle")]);
    assert!(entries.iter().all(|e| e.genre != "Indie"));

    let alpha = &entries[0];
    assert!((alpha.estimated_revenue - 100.0 * 50.0 * 10.0).abs() < 1e-6);
}

#[test]
fn test_quantile_interpolates() {
    let values = [1.0, 2.0, 3.0, 4.0];
    assert_eq!(quantile(&values, 0.25), Some(1.75));
    assert_eq!(quantile(&values, 0.5), Some(2.5));
    assert_eq!(quantile(&[7.0], 0.75), Some(7.0));
    assert_eq!(quantile(&[], 0.5), None);
}

#[test]
fn test_remove_outliers() {
    assert_eq!(remove_outliers(&[4.0, 1.0, 100.0, 2.0, 3.0]), vec![4.0, 1.0, 2.0, 3.0]);
    assert!(remove_outliers(&[]).is_empty());
}

#[test]
fn test_revenue_by_genre_orders_by_median() {
    let cleaner = CatalogCleaner::new(CatalogConfig::default());
    let entries = vec![
        entry("Puzzle", 10.0),
        entry("Puzzle", 20.0),
        entry("Action", 100.0),
        entry("Action", 300.0),
        entry("Action", 200.0),
    ];
    let stats = cleaner.revenue_by_genre(&entries);
    assert_eq!(stats[0].genre, "Action");
    assert_eq!(stats[0].median, 200.0);
    assert_eq!(stats[1].genre, "Puzzle");
    assert_eq!(stats[1].median, 15.0);
}

#[test]
fn test_revenue_by_genre_samples_first_games_only() {
    let config = CatalogConfig {
        per_genre_sample: 2,
        ..Default::default()
    };
    let cleaner = CatalogCleaner::new(config);
    let entries = vec![entry("RPG", 10.0), entry("RPG", 20.0), entry("RPG", 1000.0)];
    let stats = cleaner.revenue_by_genre(&entries);
    assert_eq!(stats[0].games, 2);
    assert_eq!(stats[0].median, 15.0);
}

#[test]
fn test_success_rate_by_genre() {
    let config = CatalogConfig {
        revenue_threshold: 50.0,
        ..Default::default()
    };
    let cleaner = CatalogCleaner::new(config);
    let entries = vec![
        entry("Action", 10.0),
        entry("Action", 60.0),
        entry("Action", 50.0),
        entry("Action", 40.0),
        entry("Puzzle", 1.0),
    ];
    let rates = cleaner.success_rate_by_genre(&entries);
    assert_eq!(rates[0].genre, "Action");
    assert_eq!(rates[0].success_rate, 50.0);
    assert_eq!(rates[1].success_rate, 0.0);
}

#[test]
fn test_genres_by_appid_deduplicates() {
    let mut entries = vec![entry("Action", 1.0), entry("Action", 2.0), entry("RPG", 3.0)];
    entries.push(GenreEntry { appid: None, ..entry("Puzzle", 4.0) });
    let map = genres_by_appid(&entries);
    assert_eq!(map.get(&1).unwrap(), &vec!["Action".to_string(), "RPG".to_string()]);
    assert_eq!(map.len(), 1);
}

#[test]
fn test_select_targets_filters_and_samples() {
    let cleaner = CatalogCleaner::new(CatalogConfig::default());
    let games = cleaner.games(&table()).unwrap();

    let everything = SelectionConfig {
        sample_fraction: 1.0,
        seed: Some(7),
        ..Default::default()
    };
    let mut all: Vec<u32> = select_targets(&games, &everything).into_iter().map(|t| t.appid).collect();
    all.sort();
    // Alpha scores too high, Beta has too few reviews
    assert_eq!(all, vec![5, 6]);

    let half = SelectionConfig {
        sample_fraction: 0.5,
        seed: Some(7),
        ..Default::default()
    };
    let first = select_targets(&games, &half);
    let second = select_targets(&games, &half);
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
}

#[test]
fn test_clean_description_and_tags() {
    assert_eq!(
        clean_description("<p>Hello, World!</p>  Fun & games"),
        "hello, world fun games"
    );
    assert_eq!(clean_tags("Action, RPG,Indie"), "action rpg indie");
}

#[test]
fn test_preprocess_games() {
    let raw = "\
appid,name,supported_languages,num_reviews_total,detailed_description,tags,header_image_url,store_page_url
10,Kept,\"['English', 'French']\",600,<b>Great</b> game!,\"Action, RPG\",http://img/10,http://store/10
11,Too Few,['English'],500,desc,Puzzle,,
12,German Only,['German'],9000,desc,Puzzle,,
";
    let table = CatalogTable::from_reader(raw.as_bytes()).unwrap();
    let games = preprocess_games(&table, &PreprocessConfig::default()).unwrap();

    assert_eq!(games.len(), 1);
    let game = &games[0];
    assert_eq!(game.appid, 10);
    assert_eq!(game.combined_text, "great game action rpg");
    assert_eq!(game.tags, "Action, RPG");
    assert_eq!(game.header_image_url, "http://img/10");

    let mut buffer = Vec::new();
    write_games_data(&mut buffer, &games).unwrap();
    assert_eq!(read_games_data(buffer.as_slice()).unwrap(), games);
}

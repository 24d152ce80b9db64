pub const CREATE_TRAIN_POSITIONS: &str = r#"
CREATE TABLE IF NOT EXISTS train_positions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_number TEXT,
    route TEXT,
    destination TEXT,
    next_station_id TEXT,
    next_station_name TEXT,
    is_approaching INTEGER,
    is_delayed INTEGER,
    lat REAL,
    lon REAL,
    heading INTEGER,
    predicted_arrival TEXT,
    fetched_at TEXT
);
"#;

pub const INSERT_TRAIN_POSITION: &str = r#"
INSERT INTO train_positions (
    run_number, route, destination, next_station_id, next_station_name,
    is_approaching, is_delayed, lat, lon, heading, predicted_arrival, fetched_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);
"#;

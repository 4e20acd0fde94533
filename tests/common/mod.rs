#![allow(dead_code)]

use courtside::catalog::SourceLayout;
use std::fs;
use std::path::Path;

pub const GAME_HEADER: &str = "season_id,team_id_home,team_abbreviation_home,team_name_home,game_id,game_date,matchup_home,wl_home,min,fgm_home,fg3_pct_home,ft_pct_home,pts_home,plus_minus_home,team_id_away,team_abbreviation_away,team_name_away,matchup_away,wl_away,fgm_away,fg3_pct_away,ft_pct_away,pts_away,plus_minus_away,season_type";

pub const LINE_SCORE_FAMILY: &[&str] = &[
    "team_id",
    "team_abbreviation",
    "team_city_name",
    "team_nickname",
    "team_wins_losses",
    "pts_qtr1",
    "pts_qtr2",
    "pts_qtr3",
    "pts_qtr4",
    "pts_ot1",
    "pts_ot2",
    "pts_ot3",
    "pts_ot4",
    "pts_ot5",
    "pts_ot6",
    "pts_ot7",
    "pts_ot8",
    "pts_ot9",
    "pts_ot10",
    "pts",
];

pub fn write(path: &Path, lines: &[&str]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut body = lines.join("\n");
    body.push('\n');
    fs::write(path, body).unwrap();
}

pub fn player_csv() -> Vec<&'static str> {
    vec![
        "id,full_name,first_name,last_name,is_active",
        "76001,Alaa Abdelnaby,Alaa,Abdelnaby,False",
        "2544,LeBron James,LeBron,James,True",
    ]
}

pub fn team_csv() -> Vec<&'static str> {
    vec![
        "id,full_name,abbreviation,nickname,city,state,year_founded",
        "1610612737,Atlanta Hawks,ATL,Hawks,Atlanta,Georgia,1949.0",
        "1610612747,Los Angeles Lakers,LAL,Lakers,Los Angeles,California,1948.0",
        "1610612760,Oklahoma City Thunder,OKC,Thunder,Oklahoma City,Oklahoma,",
    ]
}

/// Five raw games: one duplicate, one before the floor, one on it, one unparsable.
pub fn game_csv() -> Vec<&'static str> {
    vec![
        GAME_HEADER,
        "21996,1610612737,ATL,Atlanta Hawks,0029600001,1996-11-01 00:00:00,ATL vs. LAL,W,240,40.0,0.35,0.75,101.0,5.0,1610612747,LAL,Los Angeles Lakers,LAL @ ATL,L,38.0,0.30,,96.0,-5.0,Regular Season",
        "21996,1610612737,ATL,Atlanta Hawks,0029600001,1996-11-01 00:00:00,ATL vs. LAL,W,240,40.0,0.35,0.75,999.0,5.0,1610612747,LAL,Los Angeles Lakers,LAL @ ATL,L,38.0,0.30,,96.0,-5.0,Regular Season",
        "21995,1610612737,ATL,Atlanta Hawks,0029500900,1996-04-01 00:00:00,ATL vs. LAL,L,240,30.0,0.25,0.70,90.0,-2.0,1610612747,LAL,Los Angeles Lakers,LAL @ ATL,W,35.0,0.31,0.8,92.0,2.0,Regular Season",
        "21996,1610612747,LAL,Los Angeles Lakers,0029600002,1996-10-01 00:00:00,LAL vs. OKC,,240,41.0,,0.65,110.0,12.0,1610612760,OKC,Oklahoma City Thunder,OKC @ LAL,L,36.0,0.28,0.9,98.0,-12.0,Regular Season",
        "21996,1610612747,LAL,Los Angeles Lakers,0029600003,not-a-date,LAL vs. ATL,W,240,41.0,0.4,0.65,110.0,12.0,1610612737,ATL,Atlanta Hawks,ATL @ LAL,L,36.0,0.28,0.9,98.0,-12.0,Regular Season",
    ]
}

pub fn line_score_csv() -> Vec<String> {
    let mut header = vec!["game_date_est".to_string(), "game_sequence".to_string(), "game_id".to_string()];
    for side in ["_home", "_away"] {
        header.extend(LINE_SCORE_FAMILY.iter().map(|c| format!("{c}{side}")));
    }
    let side = |id: &str, code: &str, ot1: &str, total: &str| {
        format!("{id},{code},City,Nick,10-5,25,25,25,24,{ot1},,,,,,,,,,{total}")
    };
    vec![
        header.join(","),
        format!(
            "1996-11-01T00:00:00,1,0029600001,{},{}",
            side("1610612737", "ATL", "", "99"),
            side("1610612747", "LAL", "", "97")
        ),
        format!(
            "1996-11-01T00:00:00,1,0029600001,{},{}",
            side("1610612737", "ATL", "", "1"),
            side("1610612747", "LAL", "", "1")
        ),
        format!(
            "1996-11-02T00:00:00,2,0029600004,{},{}",
            side("1610612747", "LAL", "8", "107"),
            side("1610612760", "OKC", "6", "105")
        ),
        format!(
            "1995-11-02T00:00:00,2,0029500004,{},{}",
            side("1610612747", "LAL", "", "100"),
            side("1610612760", "OKC", "", "90")
        ),
    ]
}

pub fn all_seasons_csv() -> Vec<&'static str> {
    vec![
        ",player_name,team_id,team_name,team_abbreviation,age,college,season",
        "0,Gary Payton,1610612760,Seattle SuperSonics,SEA,31.0,Oregon State,1999-00",
        "1,Kobe Bryant,1610612747,Los Angeles Lakers, lal ,21.0,,1999-00",
        "2,Shareef Abdur-Rahim,1610612763,Vancouver Grizzlies,van,23.0,California,1999-00",
    ]
}

/// Write every raw source under `root` and return the layout pointing at them.
pub fn write_sources(root: &Path) -> SourceLayout {
    let layout = SourceLayout::new(root.join("basketball"), root.join("nba_players"));
    let csv_dir = layout.basketball_dir.join("csv");
    write(&csv_dir.join("player.csv"), &player_csv());
    write(&csv_dir.join("team.csv"), &team_csv());
    write(&csv_dir.join("game.csv"), &game_csv());
    let line_score = line_score_csv();
    let line_score: Vec<&str> = line_score.iter().map(String::as_str).collect();
    write(&csv_dir.join("line_score.csv"), &line_score);
    write(&layout.players_dir.join("all_seasons.csv"), &all_seasons_csv());
    layout
}

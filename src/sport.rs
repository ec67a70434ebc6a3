pub const FOOTBALL: &str = "Football";
pub const BASKETBALL: &str = "Basketball";
pub const TENNIS: &str = "Tennis";
pub const ICE_HOCKEY: &str = "Ice Hockey";
pub const BASEBALL: &str = "Baseball";
pub const AMERICAN_FOOTBALL: &str = "American Football";
pub const ESPORTS: &str = "Esports";
pub const HANDBALL: &str = "Handball";
pub const VOLLEYBALL: &str = "Volleyball";
pub const OTHER: &str = "Other";

const TEAM_SEPARATORS: [&str; 4] = [" - ", " vs ", " v ", " @ "];

const BASKETBALL_LEAGUES: &[&str] = &["nba", "euroleague", "ncaa basketball", "march madness"];
const AMERICAN_FOOTBALL_LEAGUES: &[&str] =
    &["nfl", "ncaa football", "college football", "super bowl"];
const ICE_HOCKEY_LEAGUES: &[&str] = &["nhl", "khl", "shl", "liiga", "del", "stanley cup"];
const BASEBALL_LEAGUES: &[&str] = &["mlb", "world series", "baseball"];
const TENNIS_EVENTS: &[&str] = &[
    "atp", "wta", "grand slam", "wimbledon", "roland garros", "french open", "us open",
    "australian open", "davis cup", "masters 1000",
];
const ESPORTS_EVENTS: &[&str] = &[
    "lol", "league of legends", "dota", "dota 2", "csgo", "cs:go", "cs2", "valorant",
    "overwatch", "apex legends", "call of duty", "rocket league", "fortnite", "iem", "esl",
    "blast", "pgl major", "vct",
];
const HANDBALL_EVENTS: &[&str] = &["ehf", "handball"];
const VOLLEYBALL_EVENTS: &[&str] = &["volleyball", "cev champions league", "superliga"];

const BASKETBALL_TEAMS: &[&str] = &[
    "celtics", "nets", "76ers", "sixers", "knicks", "raptors", "bulls", "cavaliers", "cavs",
    "pistons", "pacers", "bucks", "hawks", "heat", "hornets", "magic", "wizards", "nuggets",
    "timberwolves", "thunder", "trail blazers", "blazers", "jazz", "warriors", "clippers",
    "lakers", "suns", "mavericks", "mavs", "rockets", "grizzlies", "pelicans", "olympiacos",
    "panathinaikos", "fenerbahce", "zalgiris", "maccabi", "anadolu efes", "olimpia milano",
    "virtus bologna", "asvel", "baskonia", "partizan", "crvena zvezda",
];
const AMERICAN_FOOTBALL_TEAMS: &[&str] = &[
    "patriots", "bills", "dolphins", "ravens", "bengals", "browns", "steelers", "texans",
    "colts", "jaguars", "titans", "broncos", "chiefs", "raiders", "chargers", "cowboys",
    "eagles", "commanders", "bears", "lions", "packers", "vikings", "falcons", "saints",
    "buccaneers", "49ers", "seahawks",
];
const ICE_HOCKEY_TEAMS: &[&str] = &[
    "bruins", "sabres", "red wings", "canadiens", "senators", "lightning", "maple leafs",
    "hurricanes", "blue jackets", "devils", "islanders", "flyers", "penguins", "capitals",
    "blackhawks", "avalanche", "predators", "ducks", "flames", "oilers", "sharks", "kraken",
    "canucks", "golden knights", "jokerit", "ska", "lokomotiv", "frolunda", "hv71",
    "djurgarden", "lulea", "zsc", "davos",
];
const BASEBALL_TEAMS: &[&str] = &[
    "red sox", "yankees", "blue jays", "orioles", "white sox", "guardians", "tigers", "royals",
    "twins", "astros", "angels", "athletics", "mariners", "braves", "marlins", "mets",
    "phillies", "nationals", "cubs", "brewers", "pirates", "diamondbacks", "rockies",
    "dodgers", "padres",
];
const ESPORTS_TEAMS: &[&str] = &[
    "navi", "natus vincere", "faze", "g2", "vitality", "astralis", "heroic", "cloud9",
    "team liquid", "fnatic", "mouz", "t1", "gen.g", "jd gaming", "team secret",
    "evil geniuses", "team spirit", "tundra", "sentinels", "paper rex", "100 thieves",
];
const HANDBALL_TEAMS: &[&str] = &[
    "thw kiel", "kiel", "veszprem", "vardar", "flensburg", "aalborg", "kielce", "meshkov",
    "celje", "szeged", "magdeburg", "gummersbach",
];
const VOLLEYBALL_TEAMS: &[&str] = &[
    "perugia", "trentino", "lube civitanova", "zenit kazan", "zaksa", "halkbank",
    "berlin recycling", "piacenza",
];
const TENNIS_PLAYERS: &[&str] = &[
    "djokovic", "nadal", "federer", "alcaraz", "medvedev", "tsitsipas", "zverev", "rublev",
    "sinner", "ruud", "fritz", "swiatek", "sabalenka", "gauff", "rybakina", "jabeur",
    "pegula", "osaka", "raducanu",
];
const FOOTBALL_CLUBS: &[&str] = &[
    "arsenal", "chelsea", "liverpool", "manchester united", "man utd", "manchester city",
    "man city", "tottenham", "everton", "west ham", "newcastle", "aston villa", "brighton",
    "crystal palace", "brentford", "fulham", "real madrid", "barcelona", "atletico madrid",
    "sevilla", "valencia", "villarreal", "real sociedad", "athletic bilbao", "real betis",
    "bayern", "dortmund", "leipzig", "leverkusen", "gladbach", "wolfsburg", "frankfurt",
    "juventus", "inter", "milan", "napoli", "roma", "lazio", "atalanta", "fiorentina", "psg",
    "paris saint-germain", "marseille", "lyon", "monaco", "lille", "benfica", "porto",
    "sporting", "ajax", "psv", "feyenoord", "celtic", "rangers", "galatasaray", "besiktas",
    "rosenborg", "molde", "bodo/glimt", "brann",
];
const FOOTBALL_KEYWORDS: &[&str] = &[
    "fc", "united", "city", "champions league", "europa league", "premier league", "la liga",
    "bundesliga", "serie a", "ligue 1", "eredivisie", "eliteserien", "fa cup",
];

const LEAGUE_RULES: &[(&[&str], &str)] = &[
    (BASKETBALL_LEAGUES, BASKETBALL),
    (AMERICAN_FOOTBALL_LEAGUES, AMERICAN_FOOTBALL),
    (ICE_HOCKEY_LEAGUES, ICE_HOCKEY),
    (BASEBALL_LEAGUES, BASEBALL),
    (TENNIS_EVENTS, TENNIS),
    (ESPORTS_EVENTS, ESPORTS),
    (HANDBALL_EVENTS, HANDBALL),
    (VOLLEYBALL_EVENTS, VOLLEYBALL),
];

const TEAM_RULES: &[(&[&str], &str)] = &[
    (BASKETBALL_TEAMS, BASKETBALL),
    (AMERICAN_FOOTBALL_TEAMS, AMERICAN_FOOTBALL),
    (ICE_HOCKEY_TEAMS, ICE_HOCKEY),
    (BASEBALL_TEAMS, BASEBALL),
    (ESPORTS_TEAMS, ESPORTS),
    (HANDBALL_TEAMS, HANDBALL),
    (VOLLEYBALL_TEAMS, VOLLEYBALL),
    (TENNIS_PLAYERS, TENNIS),
    (FOOTBALL_CLUBS, FOOTBALL),
    (FOOTBALL_KEYWORDS, FOOTBALL),
];

pub fn detect_sport(game: &str) -> &'static str {
    let game = game.trim().to_lowercase();
    if game.is_empty() {
        return OTHER;
    }

    for &(terms, sport) in LEAGUE_RULES.iter().chain(TEAM_RULES) {
        if terms.iter().any(|term| contains_term(&game, term)) {
            return sport;
        }
    }

    // Two short names around a separator is most often a tennis match.
    if split_teams(&game).is_some() {
        let words = game.split_whitespace().count();
        if (3..=8).contains(&words) {
            return TENNIS;
        }
    }

    OTHER
}

pub fn split_teams(game: &str) -> Option<(&str, &str)> {
    let game = game.trim();
    TEAM_SEPARATORS.iter().find_map(|sep| {
        let mut parts = game.split(*sep);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(home), Some(away), None) => Some((home.trim(), away.trim())),
            _ => None,
        }
    })
}

pub fn canonical_sport(name: &str) -> &'static str {
    match name.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
        "soccer" | "football" => FOOTBALL,
        "basketball" => BASKETBALL,
        "ice hockey" | "icehockey" | "hockey" => ICE_HOCKEY,
        "american football" | "americanfootball" => AMERICAN_FOOTBALL,
        "baseball" => BASEBALL,
        "tennis" => TENNIS,
        "handball" => HANDBALL,
        "volleyball" => VOLLEYBALL,
        "esports" | "e sports" => ESPORTS,
        _ => OTHER,
    }
}

fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_team_sports_by_name() {
        assert_eq!(detect_sport("Lakers vs Celtics"), BASKETBALL);
        assert_eq!(detect_sport("Arsenal - Chelsea"), FOOTBALL);
        assert_eq!(detect_sport("Kansas City Chiefs @ Buffalo Bills"), AMERICAN_FOOTBALL);
        assert_eq!(detect_sport("Edmonton Oilers - Calgary Flames"), ICE_HOCKEY);
        assert_eq!(detect_sport("New York Yankees vs Boston Red Sox"), BASEBALL);
    }

    #[test]
    fn league_keywords_win_over_team_names() {
        assert_eq!(detect_sport("EuroLeague: Real Madrid - Barcelona"), BASKETBALL);
        assert_eq!(detect_sport("Real Madrid - Barcelona"), FOOTBALL);
    }

    #[test]
    fn short_terms_need_word_boundaries() {
        assert_eq!(detect_sport("Atletico Madrid - Getafe"), FOOTBALL);
        assert_eq!(detect_sport("T1 vs Gen.G"), ESPORTS);
    }

    #[test]
    fn head_to_head_falls_back_to_tennis() {
        assert_eq!(detect_sport("Djokovic v Nadal"), TENNIS);
        assert_eq!(detect_sport("Jan Novak - Petr Svoboda"), TENNIS);
        assert_eq!(detect_sport("Something odd"), OTHER);
        assert_eq!(detect_sport(""), OTHER);
    }

    #[test]
    fn splits_both_sides() {
        assert_eq!(split_teams("Lakers vs Celtics"), Some(("Lakers", "Celtics")));
        assert_eq!(split_teams("A - B - C"), None);
        assert_eq!(split_teams("Single"), None);
    }

    #[test]
    fn maps_database_sport_names() {
        assert_eq!(canonical_sport("Soccer"), FOOTBALL);
        assert_eq!(canonical_sport("ice-hockey"), ICE_HOCKEY);
        assert_eq!(canonical_sport("Darts"), OTHER);
    }
}

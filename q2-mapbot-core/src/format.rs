use crate::status::ServerStatus;

/// Renders a status report for chat.
///
/// Always two lines of host/map/player count, then the OpenTDM match clock when a match is
/// running, then the player names when anyone is connected.
pub fn format_status(status: &ServerStatus) -> String {
    let info = &status.info;
    let mut output = format!(
        "{}\n{} - {}/{}",
        info.get_or_empty("hostname"),
        info.get_or_empty("mapname"),
        status.player_count(),
        info.get_or_empty("maxclients"),
    );

    if info.get_or_empty("gamedir") == "opentdm" && info.get_or_empty("time_remaining") != "WARMUP"
    {
        output.push_str(&format!(
            "\nMatch time remaining: {}\nScore: {}:{}",
            info.get_or_empty("time_remaining"),
            info.get_or_empty("score_a"),
            info.get_or_empty("score_b"),
        ));
    }

    if status.player_count() > 0 {
        let names: Vec<&str> = status.players.iter().map(|p| p.name.as_str()).collect();
        output.push_str(&format!("\n[`{}`]", names.join(", ")));
    }

    output
}

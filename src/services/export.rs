//! CSV export of every guest with their score and picks.

use crate::{
    services::{guest_service, scoring, setup_service},
    state::AppState,
};

const FIXED_COLUMNS: [&str; 8] = [
    "Name",
    "RSVP",
    "Party ID",
    "Party Host",
    "Dietary",
    "Ballot Submitted",
    "Submitted At",
    "Score",
];

/// Wrap a field in double quotes, doubling embedded quotes.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|field| quote(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Render all guests as CSV: the fixed columns followed by one column per
/// configured category, every field quoted, rows separated by `\n`.
pub fn export_csv(state: &AppState) -> String {
    let categories = setup_service::get_categories(state);
    let winners = setup_service::get_winners(state);

    let header = FIXED_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .chain(categories.iter().map(|category| category.name.clone()));
    let mut lines = vec![line(header)];

    for guest in guest_service::get_guests(state) {
        let score = scoring::score_against(&guest, &winners);
        let mut row = vec![
            guest.name.clone(),
            guest.rsvp.as_export_str().to_string(),
            guest.party_id.clone().unwrap_or_default(),
            if guest.is_party_host { "Yes" } else { "" }.to_string(),
            guest.dietary.clone(),
            if guest.ballot_submitted { "Yes" } else { "No" }.to_string(),
            guest.submitted_at.clone().unwrap_or_default(),
            score.to_string(),
        ];
        row.extend(categories.iter().map(|category| {
            guest
                .predictions
                .get(&category.name)
                .cloned()
                .unwrap_or_default()
        }));
        lines.push(line(row));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            local_cache::LocalCache,
            models::{CategoryEntity, Picks, Rsvp},
        },
        services::guest_service::{MemberInput, PartySubmission},
    };

    fn split(line: &str) -> Vec<String> {
        // Fields never contain `","` in these fixtures.
        let inner = line
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap();
        inner
            .split("\",\"")
            .map(|field| field.replace("\"\"", "\""))
            .collect()
    }

    #[test]
    fn header_lists_fixed_columns_then_categories() {
        let state = AppState::new(AppConfig::default(), LocalCache::in_memory(), None);
        setup_service::save_categories(
            &state,
            vec![
                CategoryEntity::new("Best Picture", ["A"]),
                CategoryEntity::new("Best Sound", ["X"]),
            ],
        )
        .unwrap();

        let csv = export_csv(&state);
        let header = split(csv.lines().next().unwrap());
        assert_eq!(header.len(), 8 + 2);
        assert_eq!(header[0], "Name");
        assert_eq!(header[7], "Score");
        assert_eq!(header[8..], ["Best Picture", "Best Sound"]);
    }

    #[test]
    fn rows_keep_columns_aligned_and_escape_quotes() {
        let state = AppState::new(AppConfig::default(), LocalCache::in_memory(), None);
        setup_service::save_categories(
            &state,
            vec![
                CategoryEntity::new("Best Picture", ["A", "B"]),
                CategoryEntity::new("Best Song", ["\"Golden\""]),
            ],
        )
        .unwrap();
        let mut predictions = Picks::new();
        predictions.insert("Best Song".into(), "\"Golden\"".into());
        guest_service::submit_party(
            &state,
            PartySubmission {
                rsvp: Rsvp::Yes,
                dietary: "no nuts".into(),
                host: MemberInput {
                    name: "Bob".into(),
                    predictions,
                },
                companions: vec![MemberInput::named("Ann")],
                ..PartySubmission::default()
            },
        )
        .unwrap();
        setup_service::set_winner(&state, "Best Song", "\"Golden\"").unwrap();

        let csv = export_csv(&state);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("\"\"\"Golden\"\"\""));

        let bob = split(lines[1]);
        let ann = split(lines[2]);
        assert_eq!(bob.len(), 10);
        assert_eq!(ann.len(), 10);
        assert_eq!(&bob[..2], ["Bob", "yes"]);
        assert_eq!(bob[3], "Yes");
        assert_eq!(bob[4], "no nuts");
        assert_eq!(bob[5], "Yes");
        assert_eq!(bob[7], "1");
        assert_eq!(bob[8], "");
        assert_eq!(bob[9], "\"Golden\"");
        assert_eq!(ann[3], "");
        assert_eq!(ann[5], "No");
        assert_eq!(ann[7], "0");
    }
}

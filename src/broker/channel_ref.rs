/// A channel as given by the caller: either a raw Slack id or a name to resolve.
///
/// Ids are recognised by Slack's id convention: a `C` (public), `G` (legacy
/// private) or `D` (direct message) prefix followed only by uppercase ASCII
/// letters and digits, e.g. `C024BE91L`. Everything else is a name; a leading
/// `#` is dropped. `General` is therefore a name while `GENERAL1` is an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    Id(String),
    Name(String),
}

const ID_PREFIXES: [char; 3] = ['C', 'G', 'D'];

impl ChannelRef {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        if let Some(name) = input.strip_prefix('#') {
            return ChannelRef::Name(name.to_string());
        }

        let mut chars = input.chars();
        let looks_like_id = matches!(chars.next(), Some(c) if ID_PREFIXES.contains(&c))
            && input.len() > 1
            && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());

        if looks_like_id {
            ChannelRef::Id(input.to_string())
        } else {
            ChannelRef::Name(input.to_string())
        }
    }
}

//! Parsing of `MYRIGHTS` responses.

use super::FolderRights;

/// Rights needed to create notes in a folder (insert, keep-seen, write).
const CREATION_RIGHTS: [char; 3] = ['i', 's', 'w'];

/// Rights additionally needed to modify existing notes (expunge, delete).
const MODIFICATION_RIGHTS: [char; 2] = ['e', 't'];

/// Reduce a raw `MYRIGHTS` response to [`FolderRights`].
///
/// The first response line holding more than one whitespace-separated token
/// carries the rights as its last token (RFC 4314). Modification rights are
/// only meaningful on top of creation rights; without the latter, both come
/// back `false`. An unrecognizable response also yields no rights rather
/// than an error.
pub fn parse_my_rights(response: &str) -> FolderRights {
    for line in response.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() <= 1 {
            continue;
        }
        let rights = tokens[tokens.len() - 1];
        let can_create = CREATION_RIGHTS.iter().all(|r| rights.contains(*r));
        let can_modify = can_create && MODIFICATION_RIGHTS.iter().all(|r| rights.contains(*r));
        return FolderRights {
            can_create,
            can_modify,
        };
    }
    FolderRights::default()
}

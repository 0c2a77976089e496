//! Pure reconciliation steps of the sync pipeline
//!
//! Everything here is plain map/set manipulation over the settings record
//! and the fetched/pushed wire shapes; the service in `sync::mod` wires it
//! to the database, the HTTP client and the host seams.

use std::collections::{HashMap, HashSet};

use crate::models::CirclesSettings;
use crate::peers::{PeerGroupId, PeerId};
use crate::remote::{ApiCircle, CollectedCircle, Connection};

/// Circles ranked for membership conflicts: lowest ordering index wins,
/// circle id breaks ties.
fn rank(circle: &ApiCircle) -> (usize, i32) {
    (circle.index, circle.id.0)
}

/// Drop overlapping memberships: a peer claimed by several circles stays
/// only in the best-ranked one. Duplicates within a single circle (the
/// wire concatenates `peers` and `members`) collapse as well.
pub fn dedupe_circle_peers(circles: &mut [ApiCircle]) {
    let mut order: Vec<usize> = (0..circles.len()).collect();
    order.sort_by_key(|&i| rank(&circles[i]));

    let mut seen: HashSet<PeerId> = HashSet::new();
    for i in order {
        circles[i].peers.retain(|peer| seen.insert(*peer));
    }
}

/// Rebuild the remote side of the settings record from fetched circles:
/// names, ordering and remote inclusions are wiped and refilled. The
/// account's own peer is never assigned.
pub fn apply_fetched(settings: &mut CirclesSettings, circles: &[ApiCircle], user: PeerId) {
    settings.group_names.clear();
    settings.remote_inclusions.clear();
    settings.index.clear();

    for circle in circles {
        settings.index.insert(circle.id, circle.index as i32);
        settings.group_names.insert(circle.id, circle.name.clone());
        for peer in &circle.peers {
            if *peer != user {
                settings.remote_inclusions.insert(*peer, circle.id);
            }
        }
    }
}

/// Build the upload payload from collected circle -> chat -> members maps.
/// Output is sorted for a deterministic wire document.
pub fn build_payload(
    collected: &HashMap<PeerGroupId, HashMap<PeerId, Vec<PeerId>>>,
) -> Vec<CollectedCircle> {
    let mut payload: Vec<CollectedCircle> = collected
        .iter()
        .map(|(circle, chats)| {
            let mut connections: Vec<Connection> = chats
                .iter()
                .map(|(chat, members)| Connection {
                    chat: *chat,
                    members: members.clone(),
                })
                .collect();
            connections.sort_by_key(|c| c.chat);
            CollectedCircle {
                circle: *circle,
                connections,
            }
        })
        .collect();
    payload.sort_by_key(|c| c.circle);
    payload
}

/// Merge pushed chat members back into the record: walking circles in
/// index order, a member without a remote inclusion gets assigned to the
/// circle whose chat it appeared in. Existing inclusions and the account's
/// own peer are never touched.
pub fn merge_pushed(settings: &mut CirclesSettings, payload: &[CollectedCircle], user: PeerId) {
    let mut sorted: Vec<&CollectedCircle> = payload.iter().collect();
    sorted.sort_by_key(|c| (settings.index_of(c.circle), c.circle.0));

    for circle in sorted {
        for connection in &circle.connections {
            for member in &connection.members {
                if *member != user && !settings.remote_inclusions.contains_key(member) {
                    settings.remote_inclusions.insert(*member, circle.circle);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(id: i32, index: usize, peers: Vec<PeerId>) -> ApiCircle {
        ApiCircle {
            id: PeerGroupId(id),
            name: format!("circle-{}", id),
            peers,
            index,
        }
    }

    #[test]
    fn test_dedupe_lowest_index_wins() {
        let shared = PeerId::user(10);
        let mut circles = vec![
            circle(2, 1, vec![shared, PeerId::user(20)]),
            circle(1, 0, vec![shared, PeerId::user(30)]),
        ];
        dedupe_circle_peers(&mut circles);

        // Circle with index 0 keeps the shared peer
        assert_eq!(circles[1].peers, vec![shared, PeerId::user(30)]);
        assert_eq!(circles[0].peers, vec![PeerId::user(20)]);
    }

    #[test]
    fn test_dedupe_circle_id_breaks_ties() {
        let shared = PeerId::group(5);
        let mut circles = vec![
            circle(9, 0, vec![shared]),
            circle(3, 0, vec![shared]),
        ];
        dedupe_circle_peers(&mut circles);

        assert!(circles[0].peers.is_empty());
        assert_eq!(circles[1].peers, vec![shared]);
    }

    #[test]
    fn test_dedupe_within_single_circle() {
        let peer = PeerId::user(1);
        let mut circles = vec![circle(1, 0, vec![peer, peer])];
        dedupe_circle_peers(&mut circles);
        assert_eq!(circles[0].peers, vec![peer]);
    }

    #[test]
    fn test_apply_fetched_replaces_wholesale() {
        let user = PeerId::user(999);
        let mut settings = CirclesSettings::default();
        settings.group_names.insert(PeerGroupId(50), "Stale".into());
        settings
            .remote_inclusions
            .insert(PeerId::user(1), PeerGroupId(50));
        settings.index.insert(PeerGroupId(50), 4);
        settings
            .local_inclusions
            .insert(PeerId::user(2), PeerGroupId(60));

        let circles = vec![circle(7, 0, vec![PeerId::user(3), user])];
        apply_fetched(&mut settings, &circles, user);

        assert_eq!(settings.group_names.len(), 1);
        assert_eq!(
            settings.group_names.get(&PeerGroupId(7)).map(String::as_str),
            Some("circle-7")
        );
        assert_eq!(settings.index.get(&PeerGroupId(7)), Some(&0));
        // Own peer is never assigned
        assert_eq!(
            settings.remote_inclusions.get(&PeerId::user(3)),
            Some(&PeerGroupId(7))
        );
        assert!(!settings.remote_inclusions.contains_key(&user));
        // Local inclusions survive the fetch
        assert_eq!(
            settings.local_inclusions.get(&PeerId::user(2)),
            Some(&PeerGroupId(60))
        );
    }

    #[test]
    fn test_build_payload_sorted() {
        let mut collected: HashMap<PeerGroupId, HashMap<PeerId, Vec<PeerId>>> = HashMap::new();
        let mut chats = HashMap::new();
        chats.insert(PeerId::group(2), vec![PeerId::user(1)]);
        chats.insert(PeerId::group(1), vec![PeerId::user(2)]);
        collected.insert(PeerGroupId(5), chats);
        collected.insert(PeerGroupId(1), HashMap::new());

        let payload = build_payload(&collected);
        assert_eq!(payload.len(), 2);
        assert_eq!(payload[0].circle, PeerGroupId(1));
        assert_eq!(payload[1].circle, PeerGroupId(5));
        assert_eq!(payload[1].connections[0].chat, PeerId::group(1));
        assert_eq!(payload[1].connections[1].chat, PeerId::group(2));
    }

    #[test]
    fn test_merge_pushed_fills_gaps_only() {
        let user = PeerId::user(999);
        let mut settings = CirclesSettings::default();
        settings.index.insert(PeerGroupId(1), 0);
        settings.index.insert(PeerGroupId(2), 1);
        settings
            .remote_inclusions
            .insert(PeerId::user(10), PeerGroupId(2));

        let payload = vec![
            CollectedCircle {
                circle: PeerGroupId(2),
                connections: vec![Connection {
                    chat: PeerId::group(40),
                    members: vec![PeerId::user(10), PeerId::user(11)],
                }],
            },
            CollectedCircle {
                circle: PeerGroupId(1),
                connections: vec![Connection {
                    chat: PeerId::group(41),
                    members: vec![PeerId::user(11), user],
                }],
            },
        ];
        merge_pushed(&mut settings, &payload, user);

        // Existing inclusion untouched
        assert_eq!(
            settings.remote_inclusions.get(&PeerId::user(10)),
            Some(&PeerGroupId(2))
        );
        // New member lands in the lower-indexed circle (1), which wins the walk
        assert_eq!(
            settings.remote_inclusions.get(&PeerId::user(11)),
            Some(&PeerGroupId(1))
        );
        // Own peer never assigned
        assert!(!settings.remote_inclusions.contains_key(&user));
    }
}

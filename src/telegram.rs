//! Telegram media access
//!
//! Resolves channels, fetches messages (following discussion-thread
//! redirects) and streams media content to disk. The [`MediaFetcher`]
//! trait is the seam between the download pipeline and the network, so
//! batch behavior can be tested with a scripted fetcher.

use std::fs::File;
use std::io::Write;

use async_trait::async_trait;
use grammers_client::client::files::MAX_CHUNK_SIZE;
use grammers_client::session::defs::{PeerAuth, PeerId, PeerRef};
use grammers_client::types::peer::Peer;
use grammers_client::types::{Media, Message};
use grammers_client::Client;
use grammers_tl_types as tl;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ident::ChannelRef;

/// Source of downloadable content for one message.
///
/// Normally a single media object; paid-media bundles carry several,
/// downloaded back to back into the same file.
pub struct MediaSource {
    entries: Vec<Media>,
}

/// Telegram operations the download pipeline needs.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    type Source: Send;

    /// Locate the media behind (channel, message id), following the
    /// discussion-thread redirect when a discussion message id is set.
    async fn fetch_source(
        &self,
        channel: &ChannelRef,
        message_id: i32,
        discussion_message_id: Option<i32>,
    ) -> Result<Self::Source>;

    /// Stream the media content into `file`, returning the byte count.
    async fn write_media(&self, source: Self::Source, file: &mut File) -> Result<u64>;
}

/// [`MediaFetcher`] backed by a connected grammers client.
pub struct GrammersFetcher {
    client: Client,
}

impl GrammersFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Resolve a channel reference to a peer.
    async fn resolve_channel(&self, channel: &ChannelRef) -> Result<Peer> {
        match channel {
            ChannelRef::Handle(handle) => self
                .client
                .resolve_username(handle)
                .await
                .map_err(|e| {
                    Error::ResolutionError(format!("failed to resolve @{}: {}", handle, e))
                })?
                .ok_or_else(|| Error::ResolutionError(format!("channel not found: @{}", handle))),
            ChannelRef::Id(dialog_id) => self
                .client
                .resolve_peer(dialog_peer_ref(*dialog_id))
                .await
                .map_err(|e| {
                    Error::ResolutionError(format!("failed to resolve {}: {}", dialog_id, e))
                }),
        }
    }

    /// Fetch a single message by id from a resolved peer.
    async fn fetch_message(&self, peer: &Peer, message_id: i32) -> Result<Message> {
        let mut messages = self.client.get_messages_by_id(peer, &[message_id]).await?;
        messages
            .pop()
            .flatten()
            .ok_or_else(|| Error::ResolutionError(format!("message {} not found", message_id)))
    }

    /// Follow the discussion thread of (peer, message id) to its linked
    /// group and fetch the message with the discussion id there.
    async fn discussion_message(
        &self,
        peer: &Peer,
        message_id: i32,
        discussion_id: i32,
    ) -> Result<Message> {
        let request = tl::functions::messages::GetDiscussionMessage {
            peer: peer_to_input(peer),
            msg_id: message_id,
        };
        let tl::enums::messages::DiscussionMessage::Message(discussion) = self
            .client
            .invoke(&request)
            .await
            .map_err(|e| Error::ResolutionError(format!("discussion lookup failed: {}", e)))?;

        let root = discussion
            .messages
            .first()
            .ok_or_else(|| Error::ResolutionError("discussion thread is empty".to_string()))?;
        let raw_peer = match root {
            tl::enums::Message::Message(m) => Some(&m.peer_id),
            tl::enums::Message::Service(m) => Some(&m.peer_id),
            tl::enums::Message::Empty(m) => m.peer_id.as_ref(),
        };
        let group_id = raw_peer.and_then(discussion_peer_id).ok_or_else(|| {
            Error::ResolutionError("discussion thread has no group peer".to_string())
        })?;

        let group = self
            .client
            .resolve_peer(PeerRef {
                id: group_id,
                auth: PeerAuth::default(),
            })
            .await
            .map_err(|e| {
                Error::ResolutionError(format!("failed to resolve discussion group: {}", e))
            })?;

        self.fetch_message(&group, discussion_id).await
    }

    /// Extract the downloadable media of a message.
    fn media_source(&self, message: &Message) -> Result<MediaSource> {
        if let tl::enums::Message::Message(raw) = &message.raw {
            if let Some(tl::enums::MessageMedia::PaidMedia(paid)) = &raw.media {
                debug!("message {} carries a paid media bundle", message.id());
                let entries = paid_entries(paid)?
                    .into_iter()
                    .map(media_from_raw)
                    .collect::<Result<Vec<_>>>()?;
                return Ok(MediaSource { entries });
            }
        }

        let media = message
            .media()
            .ok_or_else(|| Error::NoMedia(format!("message {} carries no media", message.id())))?;
        Ok(MediaSource {
            entries: vec![media],
        })
    }
}

#[async_trait]
impl MediaFetcher for GrammersFetcher {
    type Source = MediaSource;

    async fn fetch_source(
        &self,
        channel: &ChannelRef,
        message_id: i32,
        discussion_message_id: Option<i32>,
    ) -> Result<MediaSource> {
        debug!("resolving channel {}", channel);
        let peer = self.resolve_channel(channel).await?;

        debug!("fetching message {} from {}", message_id, channel);
        let mut message = self.fetch_message(&peer, message_id).await?;

        if let Some(discussion_id) = discussion_message_id {
            let replies = match &message.raw {
                tl::enums::Message::Message(m) => m.replies.as_ref(),
                _ => None,
            };
            if !has_comments(replies) {
                return Err(Error::NoMedia(format!(
                    "message {} has no comment thread",
                    message_id
                )));
            }

            debug!("redirecting to discussion message {}", discussion_id);
            message = self
                .discussion_message(&peer, message_id, discussion_id)
                .await?;
        }

        self.media_source(&message)
    }

    async fn write_media(&self, source: MediaSource, file: &mut File) -> Result<u64> {
        let mut total = 0u64;

        for media in &source.entries {
            let mut download = self.client.iter_download(media).chunk_size(MAX_CHUNK_SIZE);
            while let Some(chunk) = download
                .next()
                .await
                .map_err(|e| Error::TelegramError(format!("download failed: {}", e)))?
            {
                file.write_all(&chunk)?;
                total += chunk.len() as u64;
            }
        }

        Ok(total)
    }
}

/// Convert a Peer to InputPeer for API calls.
fn peer_to_input(peer: &Peer) -> tl::enums::InputPeer {
    match peer {
        Peer::User(user) => {
            let (user_id, access_hash) = match &user.raw {
                tl::enums::User::User(u) => (u.id, u.access_hash.unwrap_or(0)),
                tl::enums::User::Empty(u) => (u.id, 0),
            };
            tl::enums::InputPeer::User(tl::types::InputPeerUser {
                user_id,
                access_hash,
            })
        }
        Peer::Channel(channel) => tl::enums::InputPeer::Channel(tl::types::InputPeerChannel {
            channel_id: channel.raw.id,
            access_hash: channel.raw.access_hash.unwrap_or(0),
        }),
        Peer::Group(group) => match &group.raw {
            tl::enums::Chat::Chat(c) => {
                tl::enums::InputPeer::Chat(tl::types::InputPeerChat { chat_id: c.id })
            }
            tl::enums::Chat::Channel(c) => {
                tl::enums::InputPeer::Channel(tl::types::InputPeerChannel {
                    channel_id: c.id,
                    access_hash: c.access_hash.unwrap_or(0),
                })
            }
            _ => tl::enums::InputPeer::Empty,
        },
    }
}

/// What a Bot API style dialog id actually addresses.
#[derive(Debug, PartialEq, Eq)]
enum DialogKind {
    User(i64),
    Group(i64),
    Channel(i64),
}

fn classify_dialog_id(dialog_id: i64) -> DialogKind {
    if dialog_id > 0 {
        DialogKind::User(dialog_id)
    } else if dialog_id <= -1_000_000_000_001 {
        DialogKind::Channel(-dialog_id - 1_000_000_000_000)
    } else {
        DialogKind::Group(-dialog_id)
    }
}

/// Build a PeerRef from a Bot API dialog id using ambient authority
/// (access_hash 0).
fn dialog_peer_ref(dialog_id: i64) -> PeerRef {
    let id = match classify_dialog_id(dialog_id) {
        DialogKind::User(id) => PeerId::user(id),
        DialogKind::Group(id) => PeerId::chat(id),
        DialogKind::Channel(id) => PeerId::channel(id),
    };
    PeerRef {
        id,
        auth: PeerAuth::default(),
    }
}

/// Pick the group or channel id a discussion thread lives in.
fn discussion_peer_id(peer: &tl::enums::Peer) -> Option<PeerId> {
    match peer {
        tl::enums::Peer::Channel(c) => Some(PeerId::channel(c.channel_id)),
        tl::enums::Peer::Chat(c) => Some(PeerId::chat(c.chat_id)),
        tl::enums::Peer::User(_) => None,
    }
}

/// Whether a message exposes a comment thread to redirect into.
fn has_comments(replies: Option<&tl::enums::MessageReplies>) -> bool {
    match replies {
        Some(tl::enums::MessageReplies::Replies(replies)) => replies.comments,
        None => false,
    }
}

/// Unpack a paid-media bundle into its raw media entries.
///
/// A `Preview` entry means the bundle was not purchased with this
/// account, so nothing can be downloaded.
fn paid_entries(paid: &tl::types::MessageMediaPaidMedia) -> Result<Vec<tl::enums::MessageMedia>> {
    let mut entries = Vec::new();

    for extended in &paid.extended_media {
        match extended {
            tl::enums::MessageExtendedMedia::Media(inner) => entries.push(inner.media.clone()),
            tl::enums::MessageExtendedMedia::Preview(_) => {
                return Err(Error::NoMedia(
                    "paid media is locked behind purchase (preview only)".to_string(),
                ));
            }
        }
    }

    if entries.is_empty() {
        return Err(Error::NoMedia("paid media bundle is empty".to_string()));
    }

    Ok(entries)
}

fn media_from_raw(raw: tl::enums::MessageMedia) -> Result<Media> {
    Media::from_raw(raw)
        .ok_or_else(|| Error::NoMedia("paid media entry is not downloadable".to_string()))
}

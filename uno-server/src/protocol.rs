//! The byte protocol spoken between players and the server.
//!
//! Every message is one opcode byte followed by a payload whose shape the opcode alone
//! determines. There is no length prefix, so a reader has to know each layout exactly. Cards
//! travel as two bytes, the color index then the rank index.

use std::io::ErrorKind;

use strum_macros::FromRepr;
use tokio::io::{AsyncRead, AsyncReadExt};
use uno_engine::card::{Card, CardColor, Rank};

use crate::error::ProtocolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum ClientOpcode {
    UseCard = 0,
    DrawCard = 1,
    CalledUno = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum ServerOpcode {
    DrawFromDeck = 0,
    StartGame = 1,
    InvalidCardUse = 2,
    CenterCard = 3,
    EndTurn = 4,
    RemoveFromHand = 5,
    OpponentDrawFromDeck = 6,
    PlayerWon = 7,
    Uno = 8,
    RemoveUno = 9,
}

/// Requests sent by a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Play the card at `hand_index`. For special cards `card.color` is the declared color.
    UseCard { hand_index: u8, card: Card },
    DrawCard,
    /// "Uno!" for `player` at the caller's clock `time`, which only uses its low 24 bits.
    CalledUno { player: u8, time: u32 },
}

/// Notices sent to a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    DrawFromDeck { cards: Vec<Card> },
    StartGame { player: u8, player_count: u8, center: Card },
    InvalidCardUse,
    CenterCard { card: Card },
    EndTurn { next_player: u8 },
    RemoveFromHand { player: u8, hand_index: u8, card: Card },
    OpponentDrawFromDeck { opponent: u8, count: u8 },
    PlayerWon { player: u8 },
    Uno { player: u8 },
    RemoveUno,
}

const TIME_MASK: u32 = 0x00ff_ffff;

impl ClientMessage {
    pub fn opcode(&self) -> ClientOpcode {
        match self {
            ClientMessage::UseCard { .. } => ClientOpcode::UseCard,
            ClientMessage::DrawCard => ClientOpcode::DrawCard,
            ClientMessage::CalledUno { .. } => ClientOpcode::CalledUno,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = vec![self.opcode() as u8];
        match self {
            ClientMessage::UseCard { hand_index, card } => {
                bytes.push(*hand_index);
                put_card(&mut bytes, card);
            }
            ClientMessage::DrawCard => {}
            ClientMessage::CalledUno { player, time } => {
                bytes.push(*player);
                bytes.extend_from_slice(&(time & TIME_MASK).to_le_bytes()[..3]);
            }
        }
        bytes
    }

    /// Reads one whole message. A peer hanging up before the opcode is [`ProtocolError::Closed`];
    /// hanging up inside a payload is an I/O error.
    pub async fn read_from<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, ProtocolError> {
        let opcode = read_opcode(reader).await?;
        let opcode = ClientOpcode::from_repr(opcode).ok_or(ProtocolError::UnknownOpcode(opcode))?;

        let message = match opcode {
            ClientOpcode::UseCard => ClientMessage::UseCard {
                hand_index: reader.read_u8().await?,
                card: read_card(reader).await?,
            },
            ClientOpcode::DrawCard => ClientMessage::DrawCard,
            ClientOpcode::CalledUno => {
                let player = reader.read_u8().await?;
                let mut time = [0; 4];
                reader.read_exact(&mut time[..3]).await?;
                ClientMessage::CalledUno {
                    player,
                    time: u32::from_le_bytes(time),
                }
            }
        };
        Ok(message)
    }
}

impl ServerMessage {
    pub fn opcode(&self) -> ServerOpcode {
        match self {
            ServerMessage::DrawFromDeck { .. } => ServerOpcode::DrawFromDeck,
            ServerMessage::StartGame { .. } => ServerOpcode::StartGame,
            ServerMessage::InvalidCardUse => ServerOpcode::InvalidCardUse,
            ServerMessage::CenterCard { .. } => ServerOpcode::CenterCard,
            ServerMessage::EndTurn { .. } => ServerOpcode::EndTurn,
            ServerMessage::RemoveFromHand { .. } => ServerOpcode::RemoveFromHand,
            ServerMessage::OpponentDrawFromDeck { .. } => ServerOpcode::OpponentDrawFromDeck,
            ServerMessage::PlayerWon { .. } => ServerOpcode::PlayerWon,
            ServerMessage::Uno { .. } => ServerOpcode::Uno,
            ServerMessage::RemoveUno => ServerOpcode::RemoveUno,
        }
    }

    /// Encodes the message. A `DrawFromDeck` holds at most a starting hand in practice; only the
    /// first 255 cards would fit the count byte.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = vec![self.opcode() as u8];
        match self {
            ServerMessage::DrawFromDeck { cards } => {
                let cards = &cards[..cards.len().min(u8::MAX as usize)];
                bytes.push(cards.len() as u8);
                cards.iter().for_each(|card| put_card(&mut bytes, card));
            }
            ServerMessage::StartGame {
                player,
                player_count,
                center,
            } => {
                bytes.extend_from_slice(&[*player, *player_count]);
                put_card(&mut bytes, center);
            }
            ServerMessage::CenterCard { card } => put_card(&mut bytes, card),
            ServerMessage::EndTurn { next_player } => bytes.push(*next_player),
            ServerMessage::RemoveFromHand {
                player,
                hand_index,
                card,
            } => {
                bytes.extend_from_slice(&[*player, *hand_index]);
                put_card(&mut bytes, card);
            }
            ServerMessage::OpponentDrawFromDeck { opponent, count } => {
                bytes.extend_from_slice(&[*opponent, *count])
            }
            ServerMessage::PlayerWon { player } | ServerMessage::Uno { player } => {
                bytes.push(*player)
            }
            ServerMessage::InvalidCardUse | ServerMessage::RemoveUno => {}
        }
        bytes
    }

    pub async fn read_from<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, ProtocolError> {
        let opcode = read_opcode(reader).await?;
        let opcode = ServerOpcode::from_repr(opcode).ok_or(ProtocolError::UnknownOpcode(opcode))?;

        let message = match opcode {
            ServerOpcode::DrawFromDeck => {
                let count = reader.read_u8().await?;
                let mut cards = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    cards.push(read_card(reader).await?);
                }
                ServerMessage::DrawFromDeck { cards }
            }
            ServerOpcode::StartGame => ServerMessage::StartGame {
                player: reader.read_u8().await?,
                player_count: reader.read_u8().await?,
                center: read_card(reader).await?,
            },
            ServerOpcode::InvalidCardUse => ServerMessage::InvalidCardUse,
            ServerOpcode::CenterCard => ServerMessage::CenterCard {
                card: read_card(reader).await?,
            },
            ServerOpcode::EndTurn => ServerMessage::EndTurn {
                next_player: reader.read_u8().await?,
            },
            ServerOpcode::RemoveFromHand => ServerMessage::RemoveFromHand {
                player: reader.read_u8().await?,
                hand_index: reader.read_u8().await?,
                card: read_card(reader).await?,
            },
            ServerOpcode::OpponentDrawFromDeck => ServerMessage::OpponentDrawFromDeck {
                opponent: reader.read_u8().await?,
                count: reader.read_u8().await?,
            },
            ServerOpcode::PlayerWon => ServerMessage::PlayerWon {
                player: reader.read_u8().await?,
            },
            ServerOpcode::Uno => ServerMessage::Uno {
                player: reader.read_u8().await?,
            },
            ServerOpcode::RemoveUno => ServerMessage::RemoveUno,
        };
        Ok(message)
    }
}

fn put_card(bytes: &mut Vec<u8>, card: &Card) {
    bytes.extend_from_slice(&[card.color.index(), card.rank.index()]);
}

async fn read_opcode<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u8, ProtocolError> {
    match reader.read_u8().await {
        Ok(opcode) => Ok(opcode),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(ProtocolError::Closed),
        Err(e) => Err(e.into()),
    }
}

async fn read_card<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Card, ProtocolError> {
    let color = reader.read_u8().await?;
    let rank = reader.read_u8().await?;
    Ok(Card::new(
        CardColor::from_repr(color).ok_or(ProtocolError::UnknownColor(color))?,
        Rank::from_repr(rank).ok_or(ProtocolError::UnknownRank(rank))?,
    ))
}

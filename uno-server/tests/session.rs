use std::time::Duration;

use tokio::{
    io::{duplex, AsyncWriteExt, DuplexStream},
    net::TcpStream,
    task::JoinHandle,
    time::{self, Instant},
};
use uno_engine::{
    card::{Card, CardColor, Rank},
    constants::STARTING_HAND_SIZE,
    deck::Deck,
    uno::Uno,
};
use uno_server::{
    config::SessionConfig,
    error::{ProtocolError, SessionError},
    protocol::{ClientMessage, ServerMessage},
    server::Server,
    session::{Session, SessionEnd},
};

const FILLER: Card = Card::new(CardColor::Yellow, Rank::Nine);
const WINDOW: Duration = Duration::from_secs(3);

fn card(color: CardColor, rank: Rank) -> Card {
    Card::new(color, rank)
}

/// A table with exactly the given hands, drawing `draw_pile` first and then a regular deck.
fn table(center: Card, hands: &[&[Card]], draw_pile: &[Card]) -> Uno {
    let mut cards = draw_pile.to_vec();
    let mut rest = Deck::new();
    while let Some(card) = rest.draw() {
        cards.push(card);
    }
    let hands = hands.iter().map(|hand| hand.iter().copied().collect()).collect();
    Uno::with_table(center, hands, Deck::from_cards(cards)).unwrap()
}

/// Like [`table`], with every hand padded to a full starting hand.
fn game(center: Card, hands: &[&[Card]], draw_pile: &[Card]) -> Uno {
    let padded = hands
        .iter()
        .map(|hand| {
            let mut cards = hand.to_vec();
            cards.resize(STARTING_HAND_SIZE as usize, FILLER);
            cards
        })
        .collect::<Vec<_>>();
    let padded = padded.iter().map(Vec::as_slice).collect::<Vec<_>>();
    table(center, &padded, draw_pile)
}

struct Player {
    stream: DuplexStream,
}

impl Player {
    async fn send(&mut self, message: ClientMessage) {
        self.stream.write_all(&message.encode()).await.unwrap();
    }

    async fn recv(&mut self) -> ServerMessage {
        ServerMessage::read_from(&mut self.stream).await.unwrap()
    }

    /// Start notice, own hand, then one notice per opponent.
    async fn skip_opening(&mut self, players: usize) {
        for _ in 0..players + 1 {
            self.recv().await;
        }
    }

    async fn is_closed(&mut self) -> bool {
        matches!(
            ServerMessage::read_from(&mut self.stream).await,
            Err(ProtocolError::Closed)
        )
    }
}

fn start(uno: Uno) -> (JoinHandle<Result<SessionEnd, SessionError>>, Vec<Player>) {
    let config = SessionConfig {
        players: uno.player_count(),
        uno_window: WINDOW,
    };
    let mut streams = Vec::new();
    let mut players = Vec::new();
    for _ in 0..uno.player_count() {
        let (server_side, client_side) = duplex(4096);
        streams.push(server_side);
        players.push(Player {
            stream: client_side,
        });
    }
    let session = Session::with_engine(1, uno, config);
    (tokio::spawn(session.run(streams)), players)
}

async fn started(uno: Uno) -> (JoinHandle<Result<SessionEnd, SessionError>>, Vec<Player>) {
    let count = uno.player_count();
    let (session, mut players) = start(uno);
    for player in &mut players {
        player.skip_opening(count).await;
    }
    (session, players)
}

#[tokio::test(start_paused = true)]
async fn opening_announces_start_hands_and_opponents() {
    let red_5 = card(CardColor::Red, Rank::Five);
    let uno = game(red_5, &[&[], &[], &[]], &[]);
    let hands: Vec<Vec<Card>> = (0..3).map(|p| uno.hand(p).unwrap().cards().to_vec()).collect();

    let (_session, mut players) = start(uno);

    for (id, player) in players.iter_mut().enumerate() {
        assert_eq!(
            player.recv().await,
            ServerMessage::StartGame {
                player: id as u8,
                player_count: 3,
                center: red_5,
            }
        );
        assert_eq!(
            player.recv().await,
            ServerMessage::DrawFromDeck {
                cards: hands[id].clone(),
            }
        );
        for opponent in (0..3).filter(|&opponent| opponent != id) {
            assert_eq!(
                player.recv().await,
                ServerMessage::OpponentDrawFromDeck {
                    opponent: opponent as u8,
                    count: STARTING_HAND_SIZE,
                }
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn skip_with_two_players_returns_the_turn() {
    let red_skip = card(CardColor::Red, Rank::Skip);
    let red_1 = card(CardColor::Red, Rank::One);
    let uno = game(card(CardColor::Red, Rank::Five), &[&[red_skip, red_1], &[]], &[]);
    let (_session, mut players) = started(uno).await;

    players[0]
        .send(ClientMessage::UseCard {
            hand_index: 0,
            card: red_skip,
        })
        .await;
    players[0]
        .send(ClientMessage::UseCard {
            hand_index: 0,
            card: red_1,
        })
        .await;

    for player in &mut players {
        assert_eq!(
            player.recv().await,
            ServerMessage::RemoveFromHand {
                player: 0,
                hand_index: 0,
                card: red_skip,
            }
        );
        assert_eq!(player.recv().await, ServerMessage::EndTurn { next_player: 0 });
        assert_eq!(
            player.recv().await,
            ServerMessage::RemoveFromHand {
                player: 0,
                hand_index: 0,
                card: red_1,
            }
        );
        assert_eq!(player.recv().await, ServerMessage::EndTurn { next_player: 1 });
    }
}

#[tokio::test(start_paused = true)]
async fn wild_takes_the_declared_color() {
    let green_wild = card(CardColor::Green, Rank::Wild);
    let green_2 = card(CardColor::Green, Rank::Two);
    let uno = game(
        card(CardColor::Blue, Rank::Seven),
        &[&[Card::colorless(Rank::Wild)], &[green_2]],
        &[],
    );
    let (_session, mut players) = started(uno).await;

    players[0]
        .send(ClientMessage::UseCard {
            hand_index: 0,
            card: green_wild,
        })
        .await;
    assert_eq!(
        players[1].recv().await,
        ServerMessage::RemoveFromHand {
            player: 0,
            hand_index: 0,
            card: green_wild,
        }
    );
    assert_eq!(players[1].recv().await, ServerMessage::EndTurn { next_player: 1 });

    players[1]
        .send(ClientMessage::UseCard {
            hand_index: 0,
            card: green_2,
        })
        .await;
    assert_eq!(
        players[1].recv().await,
        ServerMessage::RemoveFromHand {
            player: 1,
            hand_index: 0,
            card: green_2,
        }
    );
    assert_eq!(players[1].recv().await, ServerMessage::EndTurn { next_player: 0 });
}

#[tokio::test(start_paused = true)]
async fn invalid_plays_only_reach_the_offender() {
    let blue_3 = card(CardColor::Blue, Rank::Three);
    let uno = game(
        card(CardColor::Red, Rank::Five),
        &[&[card(CardColor::Green, Rank::One)], &[card(CardColor::Red, Rank::Two)]],
        &[blue_3],
    );
    let (_session, mut players) = started(uno).await;

    // Out of turn, then a card that cannot follow.
    players[1]
        .send(ClientMessage::UseCard {
            hand_index: 0,
            card: card(CardColor::Red, Rank::Two),
        })
        .await;
    assert_eq!(players[1].recv().await, ServerMessage::InvalidCardUse);
    players[0]
        .send(ClientMessage::UseCard {
            hand_index: 0,
            card: card(CardColor::Green, Rank::One),
        })
        .await;
    assert_eq!(players[0].recv().await, ServerMessage::InvalidCardUse);

    players[0].send(ClientMessage::DrawCard).await;
    assert_eq!(
        players[0].recv().await,
        ServerMessage::DrawFromDeck {
            cards: vec![blue_3],
        }
    );
    assert_eq!(players[0].recv().await, ServerMessage::EndTurn { next_player: 1 });
    assert_eq!(
        players[1].recv().await,
        ServerMessage::OpponentDrawFromDeck {
            opponent: 0,
            count: 1,
        }
    );
    assert_eq!(players[1].recv().await, ServerMessage::EndTurn { next_player: 1 });
}

#[tokio::test(start_paused = true)]
async fn out_of_turn_draw_is_ignored() {
    let uno = game(card(CardColor::Red, Rank::Five), &[&[], &[]], &[]);
    let (session, mut players) = started(uno).await;

    players[1].send(ClientMessage::DrawCard).await;
    drop(players.pop());

    assert!(players[0].is_closed().await);
    assert_eq!(
        session.await.unwrap().unwrap(),
        SessionEnd {
            disconnected: 1,
            winner: None,
        }
    );
}

/// Deals player 0 two cards and plays one of them, opening an Uno race.
async fn race_for_player_zero(
    penalty: Card,
) -> (JoinHandle<Result<SessionEnd, SessionError>>, Vec<Player>) {
    let red_1 = card(CardColor::Red, Rank::One);
    let uno = table(
        card(CardColor::Red, Rank::Five),
        &[&[red_1, card(CardColor::Red, Rank::Two)], &[card(CardColor::Red, Rank::Three)]],
        &[penalty],
    );
    let (session, mut players) = started(uno).await;

    players[0]
        .send(ClientMessage::UseCard {
            hand_index: 0,
            card: red_1,
        })
        .await;
    for player in &mut players {
        assert_eq!(
            player.recv().await,
            ServerMessage::RemoveFromHand {
                player: 0,
                hand_index: 0,
                card: red_1,
            }
        );
        assert_eq!(player.recv().await, ServerMessage::Uno { player: 0 });
        assert_eq!(player.recv().await, ServerMessage::EndTurn { next_player: 1 });
    }
    (session, players)
}

#[tokio::test(start_paused = true)]
async fn opponent_calling_first_costs_a_penalty_card() {
    let blue_3 = card(CardColor::Blue, Rank::Three);
    let (_session, mut players) = race_for_player_zero(blue_3).await;
    let opened = Instant::now();

    players[1]
        .send(ClientMessage::CalledUno { player: 0, time: 30 })
        .await;

    assert_eq!(
        players[0].recv().await,
        ServerMessage::DrawFromDeck {
            cards: vec![blue_3],
        }
    );
    assert!(opened.elapsed() >= WINDOW);
    assert_eq!(players[0].recv().await, ServerMessage::RemoveUno);
    assert_eq!(
        players[1].recv().await,
        ServerMessage::OpponentDrawFromDeck {
            opponent: 0,
            count: 1,
        }
    );
    assert_eq!(players[1].recv().await, ServerMessage::RemoveUno);
}

#[tokio::test(start_paused = true)]
async fn calling_first_defends_the_uno() {
    let (_session, mut players) = race_for_player_zero(card(CardColor::Blue, Rank::Three)).await;

    players[0]
        .send(ClientMessage::CalledUno { player: 0, time: 10 })
        .await;
    players[1]
        .send(ClientMessage::CalledUno { player: 0, time: 30 })
        .await;

    assert_eq!(players[0].recv().await, ServerMessage::RemoveUno);
    assert_eq!(players[1].recv().await, ServerMessage::RemoveUno);
}

#[tokio::test(start_paused = true)]
async fn nobody_calling_just_clears_the_uno() {
    let (_session, mut players) = race_for_player_zero(card(CardColor::Blue, Rank::Three)).await;

    time::sleep(WINDOW * 2).await;

    assert_eq!(players[0].recv().await, ServerMessage::RemoveUno);
    assert_eq!(players[1].recv().await, ServerMessage::RemoveUno);
}

#[tokio::test(start_paused = true)]
async fn winning_during_a_race_cancels_the_penalty() {
    let (session, mut players) = race_for_player_zero(card(CardColor::Blue, Rank::Three)).await;
    let red_3 = card(CardColor::Red, Rank::Three);

    players[1]
        .send(ClientMessage::CalledUno { player: 0, time: 5 })
        .await;
    players[1]
        .send(ClientMessage::UseCard {
            hand_index: 0,
            card: red_3,
        })
        .await;
    for player in &mut players {
        assert_eq!(
            player.recv().await,
            ServerMessage::RemoveFromHand {
                player: 1,
                hand_index: 0,
                card: red_3,
            }
        );
        assert_eq!(player.recv().await, ServerMessage::PlayerWon { player: 1 });
        assert_eq!(player.recv().await, ServerMessage::RemoveUno);
    }

    time::sleep(WINDOW * 2).await;
    drop(players.pop());

    // Nothing else, in particular no penalty draw, reaches player 0.
    assert!(players[0].is_closed().await);
    assert_eq!(
        session.await.unwrap().unwrap(),
        SessionEnd {
            disconnected: 1,
            winner: Some(1),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn removal_reports_where_the_card_really_was() {
    let red_1 = card(CardColor::Red, Rank::One);
    let uno = game(card(CardColor::Red, Rank::Five), &[&[FILLER, red_1], &[]], &[]);
    let (_session, mut players) = started(uno).await;

    players[0]
        .send(ClientMessage::UseCard {
            hand_index: 6,
            card: red_1,
        })
        .await;

    assert_eq!(
        players[1].recv().await,
        ServerMessage::RemoveFromHand {
            player: 0,
            hand_index: 1,
            card: red_1,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn emptying_a_hand_wins_without_ending_the_turn() {
    let red_1 = card(CardColor::Red, Rank::One);
    let uno = table(card(CardColor::Red, Rank::Five), &[&[red_1], &[FILLER]], &[]);
    let (session, mut players) = started(uno).await;

    players[0]
        .send(ClientMessage::UseCard {
            hand_index: 0,
            card: red_1,
        })
        .await;
    for player in &mut players {
        assert_eq!(
            player.recv().await,
            ServerMessage::RemoveFromHand {
                player: 0,
                hand_index: 0,
                card: red_1,
            }
        );
        assert_eq!(player.recv().await, ServerMessage::PlayerWon { player: 0 });
    }

    drop(players.pop());
    assert!(players[0].is_closed().await);
    assert_eq!(
        session.await.unwrap().unwrap(),
        SessionEnd {
            disconnected: 1,
            winner: Some(0),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn unknown_opcode_tears_the_session_down() {
    let uno = game(card(CardColor::Red, Rank::Five), &[&[], &[]], &[]);
    let (session, mut players) = started(uno).await;

    players[1].stream.write_all(&[7]).await.unwrap();

    assert!(players[0].is_closed().await);
    match session.await.unwrap() {
        Err(SessionError::Connection {
            player: 1,
            source: ProtocolError::UnknownOpcode(7),
        }) => {}
        other => panic!("expected a protocol error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn calling_uno_for_an_unseated_player_is_a_violation() {
    let uno = game(card(CardColor::Red, Rank::Five), &[&[], &[]], &[]);
    let (session, mut players) = started(uno).await;

    players[0]
        .send(ClientMessage::CalledUno { player: 4, time: 1 })
        .await;

    match session.await.unwrap() {
        Err(SessionError::Connection {
            player: 0,
            source: ProtocolError::UnknownPlayer(4),
        }) => {}
        other => panic!("expected a protocol error, got {other:?}"),
    }
    assert!(players[1].is_closed().await);
}

#[tokio::test(start_paused = true)]
async fn connection_count_must_match_the_table() {
    let uno = game(card(CardColor::Red, Rank::Five), &[&[], &[]], &[]);
    let (server_side, _client_side) = duplex(64);
    let session = Session::with_engine(1, uno, SessionConfig::default());

    match session.run(vec![server_side]).await {
        Err(SessionError::WrongConnectionCount {
            expected: 2,
            actual: 1,
        }) => {}
        other => panic!("expected a count mismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn lobby_seats_connections_in_a_session() {
    let config = SessionConfig {
        players: 2,
        uno_window: WINDOW,
    };
    let server = Server::bind("127.0.0.1:0", config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    let mut first = TcpStream::connect(addr).await.unwrap();
    let mut second = TcpStream::connect(addr).await.unwrap();

    let mut seats = Vec::new();
    for stream in [&mut first, &mut second] {
        match ServerMessage::read_from(stream).await.unwrap() {
            ServerMessage::StartGame {
                player,
                player_count,
                center,
            } => {
                assert_eq!(player_count, 2);
                assert!(!center.is_special());
                seats.push(player);
            }
            other => panic!("expected the game to start, got {other:?}"),
        }
    }
    seats.sort();
    assert_eq!(seats, vec![0, 1]);
}

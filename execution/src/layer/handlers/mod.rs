use super::*;

fn lottery_error(player: &PublicKey, error_code: u8, message: impl Into<String>) -> Event {
    Event::LotteryError {
        player: player.clone(),
        error_code,
        message: message.into(),
    }
}

fn lottery_error_vec(player: &PublicKey, error_code: u8, message: impl Into<String>) -> Vec<Event> {
    vec![lottery_error(player, error_code, message)]
}

mod lottery;

//! # Bank
//!
//! Balances live on the auth account; this module moves them. Transfers
//! are refused while `send_enabled` is off.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared_types::{
    Address, Codec, CodecBuilder, CodecError, CodecType, Coins, Event, ModuleError, MsgType, Tx,
};
use tracing::debug;
use usdx_store::Context;

use crate::auth::AccountKeeper;
use crate::module::Handler;
use crate::params::Subspace;

pub const ROUTE: &str = "bank";
const SEND_ENABLED_KEY: &str = "sendenabled";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankGenesis {
    pub send_enabled: bool,
}

impl Default for BankGenesis {
    fn default() -> Self {
        Self { send_enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSend {
    pub from: Address,
    pub to: Address,
    pub amount: Coins,
}

impl CodecType for MsgSend {
    const TYPE_NAME: &'static str = "bank/MsgSend";
}

impl MsgType for MsgSend {
    const ROUTE: &'static str = ROUTE;
}

pub struct BankKeeper {
    accounts: Arc<AccountKeeper>,
    params: Subspace,
}

impl BankKeeper {
    pub fn new(accounts: Arc<AccountKeeper>, params: Subspace) -> Self {
        Self { accounts, params }
    }

    pub fn get_coins(&self, ctx: &Context, addr: &Address) -> Result<Coins, ModuleError> {
        Ok(self
            .accounts
            .get_account(ctx, addr)?
            .map(|a| a.coins)
            .unwrap_or_default())
    }

    pub fn has_coins(
        &self,
        ctx: &Context,
        addr: &Address,
        amount: &Coins,
    ) -> Result<bool, ModuleError> {
        Ok(self.get_coins(ctx, addr)?.is_all_gte(amount))
    }

    /// Overwrite a balance, creating the account when missing.
    pub fn set_coins(
        &self,
        ctx: &mut Context,
        addr: &Address,
        coins: Coins,
    ) -> Result<(), ModuleError> {
        let mut account = match self.accounts.get_account(ctx, addr)? {
            Some(account) => account,
            None => self.accounts.new_account(ctx, *addr)?,
        };
        account.coins = coins;
        self.accounts.set_account(ctx, &account)
    }

    pub fn add_coins(
        &self,
        ctx: &mut Context,
        addr: &Address,
        amount: &Coins,
    ) -> Result<Coins, ModuleError> {
        let coins = self.get_coins(ctx, addr)?.checked_add(amount)?;
        self.set_coins(ctx, addr, coins.clone())?;
        Ok(coins)
    }

    pub fn subtract_coins(
        &self,
        ctx: &mut Context,
        addr: &Address,
        amount: &Coins,
    ) -> Result<Coins, ModuleError> {
        let coins = self.get_coins(ctx, addr)?.checked_sub(amount)?;
        self.set_coins(ctx, addr, coins.clone())?;
        Ok(coins)
    }

    pub fn send_coins(
        &self,
        ctx: &mut Context,
        from: &Address,
        to: &Address,
        amount: &Coins,
    ) -> Result<(), ModuleError> {
        self.subtract_coins(ctx, from, amount)?;
        self.add_coins(ctx, to, amount)?;
        debug!("[Bank] {} -> {}: {}", from, to, amount);
        Ok(())
    }

    pub fn send_enabled(&self, ctx: &Context) -> Result<bool, ModuleError> {
        Ok(self.params.get(ctx, SEND_ENABLED_KEY)?.unwrap_or(true))
    }

    pub fn set_send_enabled(&self, ctx: &mut Context, enabled: bool) -> Result<(), ModuleError> {
        self.params.set(ctx, SEND_ENABLED_KEY, &enabled)
    }

    pub fn init_genesis(
        &self,
        ctx: &mut Context,
        genesis: &BankGenesis,
    ) -> Result<(), ModuleError> {
        self.set_send_enabled(ctx, genesis.send_enabled)
    }

    pub fn export_genesis(&self, ctx: &Context) -> Result<BankGenesis, ModuleError> {
        Ok(BankGenesis {
            send_enabled: self.send_enabled(ctx)?,
        })
    }
}

pub fn handler(keeper: Arc<BankKeeper>, codec: Arc<Codec>) -> Handler {
    Arc::new(move |ctx: &mut Context, tx: &Tx| match tx.msg.msg_type.as_str() {
        MsgSend::TYPE_NAME => {
            let msg: MsgSend = codec.decode_msg(&tx.msg)?;
            handle_msg_send(ctx, &keeper, tx, &msg)
        }
        other => Err(ModuleError::UnknownRequest(format!(
            "unrecognized bank message type: {other}"
        ))),
    })
}

fn handle_msg_send(
    ctx: &mut Context,
    keeper: &BankKeeper,
    tx: &Tx,
    msg: &MsgSend,
) -> Result<(), ModuleError> {
    if msg.from != tx.signer {
        return Err(ModuleError::Unauthorized("sender must sign".to_string()));
    }
    if msg.amount.is_empty() {
        return Err(ModuleError::InvalidCoins("send amount is empty".to_string()));
    }
    if !keeper.send_enabled(ctx)? {
        return Err(ModuleError::Unauthorized("transfers are disabled".to_string()));
    }
    keeper.send_coins(ctx, &msg.from, &msg.to, &msg.amount)?;
    ctx.emit(
        Event::new("transfer")
            .attr("sender", msg.from)
            .attr("recipient", msg.to)
            .attr("amount", &msg.amount),
    );
    Ok(())
}

pub fn register_codec(builder: &mut CodecBuilder) -> Result<(), CodecError> {
    builder.register_msg::<MsgSend>()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::testing;
    use crate::params::ParamsKeeper;
    use shared_types::{codes, Msg};
    use usdx_store::StoreKey;

    fn setup() -> (Arc<BankKeeper>, Arc<Codec>, Context) {
        let codec = testing::codec();
        let keys = vec![
            StoreKey::persistent("params"),
            StoreKey::transient("transient_params"),
            StoreKey::persistent("acc"),
        ];
        let params = Arc::new(ParamsKeeper::new(keys[0].clone(), keys[1].clone()));
        let accounts = Arc::new(AccountKeeper::new(
            keys[2].clone(),
            codec.clone(),
            params.subspace("auth").unwrap(),
        ));
        let bank = Arc::new(BankKeeper::new(accounts, params.subspace("bank").unwrap()));
        (bank, codec, testing::context(&keys, 1))
    }

    fn send_tx(from: Address, to: Address, amount: &str) -> Tx {
        let msg = MsgSend {
            from,
            to,
            amount: amount.parse().unwrap(),
        };
        Tx::new(Msg::new(&msg).unwrap(), from, 0)
    }

    #[test]
    fn test_send_moves_coins_and_emits_transfer() {
        // Arrange
        let (bank, codec, mut ctx) = setup();
        let (alice, bob) = (Address([1; 20]), Address([2; 20]));
        bank.set_coins(&mut ctx, &alice, "100unitx".parse().unwrap()).unwrap();

        // Act
        let handle = handler(bank.clone(), codec);
        handle(&mut ctx, &send_tx(alice, bob, "40unitx")).unwrap();

        // Assert
        assert_eq!(bank.get_coins(&ctx, &alice).unwrap().amount_of("unitx"), 60);
        assert_eq!(bank.get_coins(&ctx, &bob).unwrap().amount_of("unitx"), 40);
        assert_eq!(ctx.events()[0].kind, "transfer");
        assert_eq!(ctx.events()[0].get("amount"), Some("40unitx"));
    }

    #[test]
    fn test_send_rejections() {
        let (bank, codec, mut ctx) = setup();
        let (alice, bob) = (Address([1; 20]), Address([2; 20]));
        bank.set_coins(&mut ctx, &alice, "10unitx".parse().unwrap()).unwrap();
        let handle = handler(bank.clone(), codec);

        let too_much = handle(&mut ctx, &send_tx(alice, bob, "11unitx")).unwrap_err();
        assert_eq!(too_much.code(), codes::INSUFFICIENT_FUNDS);

        let mut forged = send_tx(alice, bob, "1unitx");
        forged.signer = bob;
        assert_eq!(handle(&mut ctx, &forged).unwrap_err().code(), codes::UNAUTHORIZED);

        bank.set_send_enabled(&mut ctx, false).unwrap();
        assert_eq!(
            handle(&mut ctx, &send_tx(alice, bob, "1unitx")).unwrap_err().code(),
            codes::UNAUTHORIZED
        );
    }
}

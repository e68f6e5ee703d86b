use std::net::SocketAddr;

use crate::ua::AccountId;

use super::store::AccountStore;

/**
 * Pick the address to advertise in the Contact of the next outbound request.
 *
 * When a public address is known for the account, its IP is combined with the
 * port of the local socket, since the NAT mapping is keyed on that socket.
 * Otherwise the local address is used unchanged.
 *
 * @param store The account store
 * @param account The account the request is sent for
 * @param local The local socket address the request is sent from
 * @return The contact address
 */
pub fn contact_address(store: &AccountStore, account: AccountId, local: SocketAddr) -> SocketAddr {
    match store.get(account) {
        Some(public) => SocketAddr::new(public.ip(), local.port()),
        None => local,
    }
}

use crate::Adb;
use commonware_consensus::{simplex::types::view_message, threshold_simplex::types::seed_namespace};
use commonware_cryptography::{
    bls12381::primitives::{
        group::Private,
        ops,
        variant::{MinSig, Variant},
    },
    ed25519::{PrivateKey, PublicKey},
    PrivateKeyExt, Signer,
};
use commonware_runtime::{buffer::PoolRef, Clock, Metrics, Spawner, Storage};
use commonware_storage::{adb, translator::EightCap};
use commonware_utils::{NZUsize, NZU64};
use jackpot_types::{execution::Seed, NAMESPACE};
use rand::{rngs::StdRng, SeedableRng};

/// Creates a master keypair for BLS signatures used for block seeds
pub fn create_network_keypair() -> (Private, <MinSig as Variant>::Public) {
    let mut rng = StdRng::seed_from_u64(0);
    ops::keypair::<_, MinSig>(&mut rng)
}

/// Creates an account keypair for Ed25519 signatures used by users
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let mut rng = StdRng::seed_from_u64(seed);
    let private = PrivateKey::from_rng(&mut rng);
    let public = private.public_key();
    (private, public)
}

/// Creates a test seed for a view
pub fn create_seed(network_secret: &Private, view: u64) -> Seed {
    let seed_namespace = seed_namespace(NAMESPACE);
    let message = view_message(view);
    Seed::new(
        view,
        ops::sign_message::<MinSig>(network_secret, Some(&seed_namespace), &message),
    )
}

/// Creates a durable state database for testing
pub async fn create_state_adb<E: Spawner + Metrics + Storage + Clock>(
    context: &E,
) -> Adb<E, EightCap> {
    let buffer_pool = PoolRef::new(NZUsize!(1024), NZUsize!(1024));

    Adb::init(
        context.with_label("state"),
        adb::any::variable::Config {
            mmr_journal_partition: String::from("state-mmr-journal"),
            mmr_metadata_partition: String::from("state-mmr-metadata"),
            mmr_items_per_blob: NZU64!(1024),
            mmr_write_buffer: NZUsize!(1024),
            log_journal_partition: String::from("state-log-journal"),
            log_items_per_section: NZU64!(1024),
            log_write_buffer: NZUsize!(1024),
            log_compression: None,
            log_codec_config: (),
            locations_journal_partition: String::from("state-locations-journal"),
            locations_items_per_blob: NZU64!(1024),
            translator: EightCap,
            thread_pool: None,
            buffer_pool,
        },
    )
    .await
    .expect("Failed to initialize state ADB")
}

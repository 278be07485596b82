//! Advanced queue actor usage: offload/load across tiers, graceful
//! degradation when the cold tier is unavailable, and delivery-lock expiry
//! recovery.

use queue_actor_core::config::ActorConfig;
use queue_actor_core::fault_store::FaultInjectingStore;
use queue_actor_core::memory_store::MemoryStore;
use queue_actor_core::metadata::QueueConfig;
use queue_actor_core::QueueActor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("queue-actor-core advanced usage example");

    // A small segment_size makes offload/load behavior observable without
    // pushing hundreds of items.
    let small_segments = QueueConfig {
        segment_size: 4,
        buffer_segments: 1,
    };

    println!("\n--- hot/cold offload and load ---");
    let mut actor = QueueActor::activate_with_config(
        MemoryStore::new(),
        MemoryStore::new(),
        ActorConfig::new("offload-demo"),
        small_segments,
    )
    .await?;

    for i in 0..14u32 {
        actor.push(0, i.to_be_bytes().to_vec()).await?;
    }
    println!("pushed 14 items with segment_size=4; some segments should now be offloaded");
    println!("metrics after push: {:?}", actor.metrics());

    let mut popped = 0;
    while actor.pop().await?.is_some() {
        popped += 1;
    }
    println!("popped {popped} items back out, draining offloaded segments along the way");
    println!("metrics after drain: {:?}", actor.metrics());

    println!("\n--- graceful degradation when the cold tier is unavailable ---");
    let cold = FaultInjectingStore::new(MemoryStore::new());
    let mut actor =
        QueueActor::activate_with_config(MemoryStore::new(), cold, ActorConfig::new("degraded-demo"), small_segments)
            .await?;

    // Offload failures are swallowed: pushes still succeed, just without
    // moving anything to cold storage.
    for i in 0..10u32 {
        actor.push(0, i.to_be_bytes().to_vec()).await?;
    }
    println!("pushed 10 items with a permanently failing cold tier");
    let snapshot = actor.metrics();
    println!("offloads attempted: {}, offloads failed: {}", snapshot.offloads_attempted, snapshot.offloads_failed);
    println!("queue is still fully usable: {:?}", actor.pop().await?.map(|v| v.len()));
    println!("healthy (offload failures don't count): {}", actor.metrics().is_healthy());

    println!("\n--- delivery lock expiry recovery ---");
    let mut actor = QueueActor::activate(MemoryStore::new(), MemoryStore::new(), ActorConfig::new("lock-demo")).await?;
    actor.push(0, b"at-least-once payload".to_vec()).await?;

    let result = actor.pop_with_ack(Some(1)).await?;
    let lock_id = result.lock_id.unwrap();
    println!("locked item under id {lock_id} with a 1 second TTL; letting it expire unacknowledged");
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;

    // No background timer ever runs (spec.md §4.5); expiry is only noticed
    // lazily, here as a side effect of this acknowledge call.
    match actor.acknowledge(&lock_id).await {
        Err(e) => println!("acknowledge found the lock already expired: {e}"),
        Ok(_) => unreachable!(),
    }
    println!("the item was re-enqueued during recovery: {:?}", actor.pop().await?);

    Ok(())
}

//! Basic queue actor usage example.

use queue_actor_core::config::ActorConfig;
use queue_actor_core::memory_store::MemoryStore;
use queue_actor_core::QueueActor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("queue-actor-core basic usage example");

    // Activate an instance over two in-memory stores. A real deployment
    // wires the hot tier to the actor host's local state and the cold tier
    // to a shared external store; both only need to implement StateStore.
    let mut actor = QueueActor::activate(
        MemoryStore::new(),
        MemoryStore::new(),
        ActorConfig::new("orders-demo"),
    )
    .await?;
    println!("activated actor 'orders-demo'");

    println!("\npushing items across priorities...");
    actor.push(0, b"urgent refund request".to_vec()).await?;
    actor.push(5, b"routine status update".to_vec()).await?;
    actor.push(2, b"payment confirmation".to_vec()).await?;
    println!("pushed 3 items at priorities 0, 5, 2");

    println!("\ndraining with destructive Pop (priority order, FIFO within priority):");
    while let Some(item) = actor.pop().await? {
        println!("  popped: {}", String::from_utf8_lossy(&item));
    }

    println!("\ndemonstrating PopWithAck / Acknowledge...");
    actor.push(0, b"needs reliable delivery".to_vec()).await?;
    let result = actor.pop_with_ack(Some(30)).await?;
    if let (Some(item), Some(lock_id)) = (result.item, result.lock_id) {
        println!("  locked item: {}", String::from_utf8_lossy(&item));
        println!("  lock id: {lock_id}");
        let ack = actor.acknowledge(&lock_id).await?;
        println!("  acknowledged {} item(s); lock released", ack.items_acknowledged);
    }

    let snapshot = actor.metrics();
    println!("\nmetrics snapshot:");
    println!("  pushes: {}", snapshot.pushes);
    println!("  pops: {}", snapshot.pops);
    println!("  locks created: {}", snapshot.locks_created);
    println!("  acknowledged: {}", snapshot.acknowledged);
    println!("  healthy: {}", snapshot.is_healthy());

    Ok(())
}

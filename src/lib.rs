//! # blockheap - A Fixed-Region Heap Allocator
//!
//! This crate implements a user-space heap allocator over a single, fixed,
//! caller-supplied memory region. It services `allocate`, `free`, and
//! `reallocate` entirely from that region, with no recourse to OS memory
//! facilities once initialized.
//!
//! ## Overview
//!
//! Every byte of bookkeeping is stolen from the region itself — there is no
//! out-of-band metadata. Each block is a one-word header (payload size plus
//! an allocation-status bit) immediately followed by its payload:
//!
//! ```text
//!   Region layout:
//!
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                         CALLER'S BUFFER                          │
//!   │                                                                  │
//!   │  ┌────────┬───────────────┐┌────────┬────────┐┌────────┬──────┐  │
//!   │  │ header │ payload (A)   ││ header │ payload││ header │ ...  │  │
//!   │  └────────┴───────────────┘└────────┴────────┘└────────┴──────┘  │
//!   │                                                                  │
//!   └──────────────────────────────────────────────────────────────────┘
//!
//!   header = payload_size | status_bit   (status: 0 = free, 1 = allocated)
//! ```
//!
//! ## Two variants
//!
//! Both variants share the block format and client contract above; they
//! differ only in how they locate a free block large enough for a request:
//!
//! - [`ImplicitHeap`] discovers free blocks by walking every block in
//!   address order on every allocation. It carries no extra state.
//! - [`ExplicitHeap`] threads a doubly linked list through the payloads of
//!   free blocks (the first two words hold `prev`/`next` header addresses),
//!   so allocation only ever inspects free blocks, and `free` coalesces
//!   eagerly with the block's right neighbor.
//!
//! ## Crate Structure
//!
//! ```text
//!   blockheap
//!   ├── align      - the round_up! macro shared by every size computation
//!   ├── block      - the header codec: is_free/payload_size/set/next
//!   ├── region     - the region descriptor (bounds + nused accounting)
//!   ├── freelist   - the explicit variant's doubly linked free list
//!   ├── implicit   - ImplicitHeap
//!   └── explicit   - ExplicitHeap
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use blockheap::ImplicitHeap;
//!
//! let mut region = [0u8; 256];
//! let mut heap = ImplicitHeap::init(&mut region).unwrap();
//!
//! unsafe {
//!     let p = heap.allocate(64);
//!     assert!(!p.is_null());
//!     p.write(42);
//!     assert_eq!(p.read(), 42);
//!     heap.free(p);
//! }
//! assert!(heap.validate());
//! ```
//!
//! ## Contract
//!
//! Every public operation returns a sentinel on failure — a null pointer
//! from `allocate`/`reallocate`, `None` from `init`, `false` from
//! `validate` — rather than panicking or returning a `Result`. Passing a
//! pointer to `free`/`reallocate` that was never returned by this heap, or
//! one already freed, is undefined behavior the allocator does not detect.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no locks, no reentrancy.
//! - **Single fixed region**: no growth, no multiple regions.
//! - **Word alignment only**: no support for over-aligned requests.
//! - **Forward-only coalescing** (explicit variant): merges only with the
//!   right neighbor; a block whose left neighbor is already free is not
//!   retroactively merged into it.
//!
//! ## Safety
//!
//! This crate is inherently unsafe as it deals with raw memory management;
//! `allocate`, `free`, and `reallocate` are `unsafe` because their returned
//! pointers alias into the caller's buffer outside the borrow checker's
//! view.

pub mod align;
pub mod block;
pub mod explicit;
pub mod freelist;
pub mod implicit;
pub mod region;

pub use block::{MAX_REQUEST, W};
pub use explicit::ExplicitHeap;
pub use implicit::ImplicitHeap;

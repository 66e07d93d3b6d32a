use std::sync::{Arc, Mutex};

use rxsched::{scheduler::current_thread_name, subscribe::Subscriber};

/// Everything a recording subscriber saw, together with the thread of each
/// callback.
pub struct Emissions<T> {
    pub nexts: Arc<Mutex<Vec<T>>>,
    pub errors: Arc<Mutex<Vec<String>>>,
    pub completes: Arc<Mutex<usize>>,
    pub threads: Arc<Mutex<Vec<(&'static str, String)>>>,
}

impl<T: Clone> Emissions<T> {
    pub fn nexts(&self) -> Vec<T> {
        self.nexts.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn completes(&self) -> usize {
        *self.completes.lock().unwrap()
    }

    /// Thread names of the callbacks labeled `label`, in call order.
    pub fn threads_of(&self, label: &str) -> Vec<String> {
        self.threads
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == label)
            .map(|(_, t)| t.clone())
            .collect()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.threads.lock().unwrap().iter().map(|(l, _)| *l).collect()
    }
}

pub fn register_emissions_subscriber<T: Send + 'static>() -> (Subscriber<T>, Emissions<T>) {
    let nexts = Arc::new(Mutex::new(Vec::with_capacity(5)));
    let nexts_c = Arc::clone(&nexts);

    let errors = Arc::new(Mutex::new(Vec::new()));
    let errors_c = Arc::clone(&errors);

    let completes = Arc::new(Mutex::new(0));
    let completes_c = Arc::clone(&completes);

    let threads = Arc::new(Mutex::new(Vec::new()));
    let threads_next = Arc::clone(&threads);
    let threads_error = Arc::clone(&threads);
    let threads_complete = Arc::clone(&threads);
    let threads_subscribe = Arc::clone(&threads);

    let mut subscriber = Subscriber::new(
        move |n| {
            // Track next() calls.
            threads_next
                .lock()
                .unwrap()
                .push(("next", current_thread_name()));
            nexts_c.lock().unwrap().push(n);
        },
        move |e| {
            // Track error() calls.
            threads_error
                .lock()
                .unwrap()
                .push(("error", current_thread_name()));
            errors_c.lock().unwrap().push(e.to_string());
        },
        move || {
            // Track complete() calls.
            threads_complete
                .lock()
                .unwrap()
                .push(("complete", current_thread_name()));
            *completes_c.lock().unwrap() += 1;
        },
    );
    subscriber.on_subscribe(move |_| {
        threads_subscribe
            .lock()
            .unwrap()
            .push(("subscribe", current_thread_name()));
    });

    (
        subscriber,
        Emissions {
            nexts,
            errors,
            completes,
            threads,
        },
    )
}

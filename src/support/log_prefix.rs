//-
// Copyright (c) 2025, Davchain contributors
//
// This file is part of Davchain.
//
// Davchain is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Davchain is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Davchain. If not, see <http://www.gnu.org/licenses/>.

use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex};

/// Tracks text that should be included at the start of every log statement
/// made on behalf of one request.
///
/// Clones of a `LogPrefix` share the same underlying data, so a user learnt
/// during authentication shows up in lines logged by plugins afterwards.
#[derive(Clone)]
pub struct LogPrefix {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Clone, Default)]
struct Inner {
    protocol: String,
    user: Option<String>,
    remote: Option<String>,
    user_agent: Option<String>,
}

impl LogPrefix {
    pub fn new(protocol: String) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                protocol,
                ..Inner::default()
            })),
        }
    }

    pub fn set_user(&self, user: String) {
        self.lock().user = Some(sanitise(user));
    }

    pub fn set_remote(&self, remote: String) {
        self.lock().remote = Some(sanitise(remote));
    }

    pub fn set_user_agent(&self, user_agent: String) {
        self.lock().user_agent = Some(sanitise(user_agent));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the prefix in a state
        // worse than "slightly wrong", so just take the data back.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Display for LogPrefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inner = self.lock();
        write!(f, "{}", inner.protocol)?;
        if inner.user.is_some()
            || inner.remote.is_some()
            || inner.user_agent.is_some()
        {
            write!(f, "[")?;
            let mut first = true;
            if let Some(ref user) = inner.user {
                write!(f, "{user}")?;
                first = false;
            }

            if let Some(ref remote) = inner.remote {
                if !mem::take(&mut first) {
                    write!(f, " ")?;
                }
                write!(f, "remote={remote}")?;
            }

            if let Some(ref user_agent) = inner.user_agent {
                if !mem::take(&mut first) {
                    write!(f, " ")?;
                }
                write!(f, "agent={user_agent}")?;
            }
            write!(f, "]")?;
        }

        Ok(())
    }
}

fn sanitise(mut s: String) -> String {
    s.retain(|c| !c.is_control());
    if let Some((truncate_len, _)) = s.char_indices().nth(64) {
        s.truncate(truncate_len);
    }

    s
}
